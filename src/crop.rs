//! The normalized crop rectangle.
//!
//! Coordinates are fractions of the image's natural size, so `(0, 0, 1, 1)`
//! is the full frame regardless of how the image is displayed. Every
//! constructor and mutator clamps instead of failing.

use eframe::egui;

/// Smallest allowed width or height, as a fraction of the image (1%).
pub const MIN_SIZE: f32 = 0.01;

/// Slack used when comparing far edges against 1.0.
pub const EPSILON: f32 = 1e-5;

/// Natural (decoded) pixel dimensions of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn to_vec2(self) -> egui::Vec2 {
        egui::vec2(self.width as f32, self.height as f32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// A crop region in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Default for CropRect {
    /// Centered, covering 80% of the image: what a freshly loaded image gets.
    fn default() -> Self {
        Self {
            x: 0.1,
            y: 0.1,
            w: 0.8,
            h: 0.8,
        }
    }
}

impl CropRect {
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    /// Builds a rectangle and clamps it into the valid range.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }.clamped()
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Size first, then position: shrink to fit, then slide back inside.
    pub fn clamped(self) -> Self {
        let w = finite_or(self.w, 1.0).clamp(MIN_SIZE, 1.0);
        let h = finite_or(self.h, 1.0).clamp(MIN_SIZE, 1.0);
        let x = finite_or(self.x, 0.0).clamp(0.0, 1.0 - w);
        let y = finite_or(self.y, 0.0).clamp(0.0, 1.0 - h);
        Self { x, y, w, h }
    }

    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.w >= MIN_SIZE
            && self.h >= MIN_SIZE
            && self.right() <= 1.0 + EPSILON
            && self.bottom() <= 1.0 + EPSILON
    }

    /// Width / height in normalized units.
    pub fn aspect(&self) -> f32 {
        self.w / self.h
    }

    /// Maps the crop onto the on-screen image rect.
    pub fn to_screen(&self, image_rect: egui::Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            image_rect.lerp_inside(egui::vec2(self.x, self.y)),
            image_rect.lerp_inside(egui::vec2(self.right(), self.bottom())),
        )
    }

    /// Rounded pixel readout, for display in the crop panel.
    pub fn to_pixels(&self, natural: ImageSize) -> PixelRect {
        let (nw, nh) = (natural.width as f32, natural.height as f32);
        PixelRect {
            x: (self.x * nw).round() as u32,
            y: (self.y * nh).round() as u32,
            width: (self.w * nw).round() as u32,
            height: (self.h * nh).round() as u32,
        }
    }

    /// Re-fits the crop to a newly selected normalized ratio, keeping the
    /// origin and width where possible.
    pub fn fit_aspect(self, ratio: f32) -> Self {
        let mut out = self;
        out.h = out.w / ratio;
        if out.y + out.h > 1.0 {
            out.h = 1.0 - out.y;
            out.w = out.h * ratio;
        }
        if out.x + out.w > 1.0 {
            out.w = 1.0 - out.x;
            out.h = out.w / ratio;
        }
        out.clamped()
    }

    /// Sets the width from a pixel value. With a locked ratio the height
    /// follows; if that overflows the bottom edge the height is capped and
    /// the width recomputed from it.
    pub fn with_pixel_width(self, px: f32, natural: ImageSize, ratio: Option<f32>) -> Self {
        if natural.width == 0 || natural.height == 0 {
            return self;
        }
        let mut out = self;
        out.w = (px / natural.width as f32).min(1.0 - self.x).max(MIN_SIZE);
        if let Some(ratio) = ratio {
            out.h = out.w / ratio;
            if out.h > 1.0 - self.y {
                out.h = 1.0 - self.y;
                out.w = out.h * ratio;
            }
        }
        out.clamped()
    }

    /// Height counterpart of [`CropRect::with_pixel_width`].
    pub fn with_pixel_height(self, px: f32, natural: ImageSize, ratio: Option<f32>) -> Self {
        if natural.width == 0 || natural.height == 0 {
            return self;
        }
        let mut out = self;
        out.h = (px / natural.height as f32).min(1.0 - self.y).max(MIN_SIZE);
        if let Some(ratio) = ratio {
            out.w = out.h * ratio;
            if out.w > 1.0 - self.x {
                out.w = 1.0 - self.x;
                out.h = out.w / ratio;
            }
        }
        out.clamped()
    }

    /// Moves one edge of the crop to a pixel position; size is unchanged.
    pub fn with_pixel_position(self, axis: Axis, px: f32, natural: ImageSize) -> Self {
        if natural.width == 0 || natural.height == 0 {
            return self;
        }
        let mut out = self;
        match axis {
            Axis::X => out.x = (px / natural.width as f32).clamp(0.0, 1.0 - self.w),
            Axis::Y => out.y = (px / natural.height as f32).clamp(0.0, 1.0 - self.h),
        }
        out
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v } else { fallback }
}
