use crate::crop::ImageSize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AspectRatioMode {
    #[default]
    Free,
    Original,
    Square,
    // Landscape
    R16_9,
    R4_3,
    R3_2,
    // Portrait
    R9_16,
    R3_4,
    R2_3,
    Custom { w: u32, h: u32 },
}

impl AspectRatioMode {
    pub const LANDSCAPE: [AspectRatioMode; 3] = [Self::R16_9, Self::R4_3, Self::R3_2];
    pub const PORTRAIT: [AspectRatioMode; 3] = [Self::R9_16, Self::R3_4, Self::R2_3];

    pub fn counterpart(&self) -> Self {
        match *self {
            Self::R16_9 => Self::R9_16,
            Self::R4_3 => Self::R3_4,
            Self::R3_2 => Self::R2_3,
            Self::R9_16 => Self::R16_9,
            Self::R3_4 => Self::R4_3,
            Self::R2_3 => Self::R3_2,
            Self::Custom { w, h } => Self::Custom { w: h, h: w },
            other => other,
        }
    }

    pub fn is_portrait(&self) -> bool {
        match *self {
            Self::R9_16 | Self::R3_4 | Self::R2_3 => true,
            Self::Custom { w, h } => h > w,
            _ => false,
        }
    }

    /// Target width / height in pixels, `None` when unconstrained.
    pub fn pixel_ratio(&self, natural: ImageSize) -> Option<f32> {
        match *self {
            Self::Free => None,
            Self::Original => Some(natural.aspect()),
            Self::Square => Some(1.0),
            Self::R16_9 => Some(16.0 / 9.0),
            Self::R4_3 => Some(4.0 / 3.0),
            Self::R3_2 => Some(3.0 / 2.0),
            Self::R9_16 => Some(9.0 / 16.0),
            Self::R3_4 => Some(3.0 / 4.0),
            Self::R2_3 => Some(2.0 / 3.0),
            Self::Custom { w, h } => Some(w.max(1) as f32 / h.max(1) as f32),
        }
    }

    /// The ratio the resize engine works with: pixel ratio rescaled into
    /// normalized crop space, where the image is always `1 x 1`.
    pub fn normalized_ratio(&self, natural: ImageSize) -> Option<f32> {
        if natural.width == 0 || natural.height == 0 {
            return None;
        }
        self.pixel_ratio(natural)
            .map(|r| r * (natural.height as f32 / natural.width as f32))
    }
}

impl std::fmt::Display for AspectRatioMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AspectRatioMode::Free => write!(f, "Free"),
            AspectRatioMode::Original => write!(f, "Original"),
            AspectRatioMode::Square => write!(f, "1:1"),
            AspectRatioMode::R16_9 => write!(f, "16:9"),
            AspectRatioMode::R4_3 => write!(f, "4:3"),
            AspectRatioMode::R3_2 => write!(f, "3:2"),
            AspectRatioMode::R9_16 => write!(f, "9:16"),
            AspectRatioMode::R3_4 => write!(f, "3:4"),
            AspectRatioMode::R2_3 => write!(f, "2:3"),
            AspectRatioMode::Custom { w, h } => write!(f, "{}:{}", w, h),
        }
    }
}
