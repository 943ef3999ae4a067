//! Boundary to an external image-editing service.
//!
//! The crop engine only hands over encoded bytes and a prompt and takes
//! back encoded bytes. Transport, retries and credentials belong to the
//! implementor.

use thiserror::Error;

use crate::export::EncodedImage;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessorError {
    pub message: String,
}

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait ImageProcessor {
    /// Returns the edited image as encoded bytes in any decodable format.
    fn process(&self, image: &EncodedImage, prompt: &str) -> Result<Vec<u8>, ProcessorError>;
}

impl<F> ImageProcessor for F
where
    F: Fn(&EncodedImage, &str) -> Result<Vec<u8>, ProcessorError>,
{
    fn process(&self, image: &EncodedImage, prompt: &str) -> Result<Vec<u8>, ProcessorError> {
        self(image, prompt)
    }
}
