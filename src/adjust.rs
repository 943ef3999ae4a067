//! Geometry and colour parameters read by the bake stage.

/// Percent values follow CSS filter semantics: 100 is identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdjustmentSettings {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Gaussian standard deviation in pixels.
    pub blur: f32,
    /// Degrees, positive is clockwise.
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    /// -100..100; warm tints towards sepia, cool rotates hue.
    pub warmth: f32,
}

impl Default for AdjustmentSettings {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            warmth: 0.0,
        }
    }
}

impl AdjustmentSettings {
    pub const PERCENT_RANGE: std::ops::RangeInclusive<f32> = 0.0..=200.0;
    pub const BLUR_RANGE: std::ops::RangeInclusive<f32> = 0.0..=20.0;
    pub const ROTATION_RANGE: std::ops::RangeInclusive<f32> = -180.0..=180.0;
    pub const WARMTH_RANGE: std::ops::RangeInclusive<f32> = -100.0..=100.0;

    pub fn clamped(self) -> Self {
        let clamp = |v: f32, r: &std::ops::RangeInclusive<f32>, d: f32| {
            if v.is_finite() { v.clamp(*r.start(), *r.end()) } else { d }
        };
        Self {
            brightness: clamp(self.brightness, &Self::PERCENT_RANGE, 100.0),
            contrast: clamp(self.contrast, &Self::PERCENT_RANGE, 100.0),
            saturation: clamp(self.saturation, &Self::PERCENT_RANGE, 100.0),
            blur: clamp(self.blur, &Self::BLUR_RANGE, 0.0),
            rotation: clamp(self.rotation, &Self::ROTATION_RANGE, 0.0),
            warmth: clamp(self.warmth, &Self::WARMTH_RANGE, 0.0),
            ..self
        }
    }

    pub fn has_geometry(&self) -> bool {
        self.rotation != 0.0 || self.flip_x || self.flip_y
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Rotates by 90 degrees, wrapping into -180..=180.
    pub fn rotate_quarter(&mut self, clockwise: bool) {
        let step = if clockwise { 90.0 } else { -90.0 };
        let mut r = self.rotation + step;
        if r > 180.0 {
            r -= 360.0;
        } else if r < -180.0 {
            r += 360.0;
        }
        self.rotation = r;
    }

    /// Keeps rotation and flips, replaces colour values with the preset's.
    pub fn with_preset(self, preset: FilterPreset) -> Self {
        let base = Self {
            rotation: self.rotation,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            ..Self::default()
        };
        match preset {
            FilterPreset::Original => base,
            FilterPreset::Vivid => Self {
                brightness: 105.0,
                contrast: 120.0,
                saturation: 130.0,
                ..base
            },
            FilterPreset::Mono => Self {
                contrast: 120.0,
                saturation: 0.0,
                ..base
            },
            FilterPreset::Warm => Self {
                saturation: 110.0,
                warmth: 30.0,
                ..base
            },
            FilterPreset::Cool => Self {
                brightness: 105.0,
                saturation: 90.0,
                warmth: -30.0,
                ..base
            },
            FilterPreset::Dramatic => Self {
                brightness: 90.0,
                contrast: 140.0,
                saturation: 80.0,
                ..base
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterPreset {
    Original,
    Vivid,
    Mono,
    Warm,
    Cool,
    Dramatic,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 6] = [
        Self::Original,
        Self::Vivid,
        Self::Mono,
        Self::Warm,
        Self::Cool,
        Self::Dramatic,
    ];
}

impl std::fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilterPreset::Original => "Original",
            FilterPreset::Vivid => "Vivid",
            FilterPreset::Mono => "B&W",
            FilterPreset::Warm => "Warm",
            FilterPreset::Cool => "Cool",
            FilterPreset::Dramatic => "Dramatic",
        };
        write!(f, "{}", s)
    }
}
