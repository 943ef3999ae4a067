//! Slicing the baked raster to the crop and encoding the result.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use crate::crop::{CropRect, PixelRect};
use crate::error::{EditorError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Bmp,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Jpeg, Self::Png, Self::Webp, Self::Bmp];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
            ExportFormat::Webp => "webp",
            ExportFormat::Bmp => "bmp",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Png => "image/png",
            ExportFormat::Webp => "image/webp",
            ExportFormat::Bmp => "image/bmp",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Png => "PNG",
            ExportFormat::Webp => "WebP",
            ExportFormat::Bmp => "BMP",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// 0..1, only read by lossy formats.
    pub quality: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality: 1.0,
        }
    }
}

impl ExportOptions {
    fn jpeg_quality(&self) -> u8 {
        let q = if self.quality.is_finite() { self.quality } else { 1.0 };
        (q.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
    }
}

/// An encoded export, ready to be written out or handed to a collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Floors the normalized crop against the baked raster's dimensions.
pub fn pixel_crop(crop: &CropRect, width: u32, height: u32) -> Result<PixelRect> {
    let (bw, bh) = (width as f32, height as f32);
    let x = (crop.x * bw).floor().max(0.0) as i64;
    let y = (crop.y * bh).floor().max(0.0) as i64;
    let w = ((crop.w * bw).floor() as i64).min(width as i64 - x);
    let h = ((crop.h * bh).floor() as i64).min(height as i64 - y);
    if w <= 0 || h <= 0 {
        return Err(EditorError::DegenerateCrop {
            width: w,
            height: h,
        });
    }
    Ok(PixelRect {
        x: x as u32,
        y: y as u32,
        width: w as u32,
        height: h as u32,
    })
}

/// Copies the cropped region into a fresh buffer of exactly its size.
pub fn slice(baked: &RgbaImage, crop: &CropRect) -> Result<RgbaImage> {
    let r = pixel_crop(crop, baked.width(), baked.height())?;
    Ok(imageops::crop_imm(baked, r.x, r.y, r.width, r.height).to_image())
}

pub fn encode(image: &RgbaImage, options: &ExportOptions) -> Result<EncodedImage> {
    let (w, h) = image.dimensions();
    let mut bytes = Vec::new();
    let written = match options.format {
        ExportFormat::Jpeg => {
            // JPEG has no alpha; transparent areas come out black.
            let rgb = flatten_on_black(image);
            JpegEncoder::new_with_quality(&mut bytes, options.jpeg_quality()).write_image(
                rgb.as_raw(),
                w,
                h,
                ExtendedColorType::Rgb8,
            )
        }
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(image.as_raw(), w, h, ExtendedColorType::Rgba8)
        }
        ExportFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
            image.as_raw(),
            w,
            h,
            ExtendedColorType::Rgba8,
        ),
        ExportFormat::Bmp => {
            BmpEncoder::new(&mut bytes).write_image(image.as_raw(), w, h, ExtendedColorType::Rgba8)
        }
    };
    written.map_err(|source| EditorError::Encode {
        format: options.format,
        source,
    })?;
    Ok(EncodedImage {
        format: options.format,
        bytes,
    })
}

/// Slice then encode.
pub fn export(baked: &RgbaImage, crop: &CropRect, options: &ExportOptions) -> Result<EncodedImage> {
    let cropped = slice(baked, crop)?;
    encode(&cropped, options)
}

fn flatten_on_black(image: &RgbaImage) -> image::RgbImage {
    image::RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let a = p[3] as u32;
        let c = |v: u8| ((v as u32 * a + 127) / 255) as u8;
        image::Rgb([c(p[0]), c(p[1]), c(p[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn pattern(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 7, 255]))
    }

    #[test]
    fn full_frame_slice_is_the_bake() {
        let baked = pattern(33, 21);
        assert_eq!(slice(&baked, &CropRect::FULL).unwrap(), baked);
    }

    #[test]
    fn pixel_crop_floors_each_term() {
        let crop = CropRect::new(0.25, 0.1, 0.5, 0.35);
        let r = pixel_crop(&crop, 101, 49).unwrap();
        assert_eq!(r, PixelRect { x: 25, y: 4, width: 50, height: 17 });
    }

    #[test]
    fn sliced_region_matches_source_pixels() {
        let baked = pattern(40, 20);
        let out = slice(&baked, &CropRect::new(0.5, 0.5, 0.25, 0.5)).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(*out.get_pixel(0, 0), Rgba([20, 10, 7, 255]));
        assert_eq!(*out.get_pixel(9, 9), Rgba([29, 19, 7, 255]));
    }

    #[test]
    fn tiny_image_crop_is_degenerate() {
        let baked = pattern(50, 50);
        let crop = CropRect::new(0.0, 0.0, 0.01, 0.5);
        match slice(&baked, &crop) {
            Err(EditorError::DegenerateCrop { width, height }) => {
                assert_eq!(width, 0);
                assert_eq!(height, 25);
            }
            other => panic!("expected degenerate crop, got {:?}", other.map(|i| i.dimensions())),
        }
    }

    #[test]
    fn png_export_decodes_to_floored_size() {
        let baked = pattern(64, 48);
        let crop = CropRect::new(0.1, 0.2, 0.33, 0.5);
        let options = ExportOptions {
            format: ExportFormat::Png,
            quality: 1.0,
        };
        let encoded = export(&baked, &crop, &options).unwrap();
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (21, 24));
        assert_eq!(decoded.to_rgba8(), slice(&baked, &crop).unwrap());
    }

    #[test]
    fn jpeg_export_decodes_with_same_dimensions() {
        let baked = pattern(30, 30);
        let encoded = export(&baked, &CropRect::default(), &ExportOptions::default()).unwrap();
        assert_eq!(encoded.format, ExportFormat::Jpeg);
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 24));
    }

    #[test]
    fn data_url_carries_mime() {
        let encoded = EncodedImage {
            format: ExportFormat::Png,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(encoded.to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn jpeg_quality_maps_to_percent() {
        let q = |quality| ExportOptions { format: ExportFormat::Jpeg, quality }.jpeg_quality();
        assert_eq!(q(1.0), 100);
        assert_eq!(q(0.5), 50);
        assert_eq!(q(0.0), 1);
        assert_eq!(q(f32::NAN), 100);
    }
}
