//! Display-only zoom and pan. Nothing here feeds back into the crop rect.

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::crop::ImageSize;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub zoom: f32,
    /// Offset in screen pixels.
    pub pan: egui::Vec2,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: egui::Vec2::ZERO,
        }
    }
}

impl ViewportState {
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn zoom_in(&mut self, step: f32) {
        self.set_zoom(self.zoom + step);
    }

    pub fn zoom_out(&mut self, step: f32) {
        self.set_zoom(self.zoom - step);
    }

    /// Wheel zoom about the view center. `delta_y` follows the browser
    /// convention: positive means scrolling down, which zooms out.
    pub fn wheel(&mut self, delta_y: f32, sensitivity: f32) {
        self.set_zoom(self.zoom * (1.0 + (-delta_y * sensitivity)));
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Percentage readout for the zoom controls.
    pub fn percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// On-screen image rect: `fit` scaled by zoom about its center, then panned.
    pub fn screen_rect(&self, fit: egui::Rect) -> egui::Rect {
        egui::Rect::from_center_size(fit.center() + self.pan, fit.size() * self.zoom)
    }
}

/// The unzoomed display rect: the image scaled to fit `container` less
/// `padding`, with floored pixel dimensions, centered.
pub fn fit_rect(container: egui::Rect, natural: ImageSize, padding: f32) -> egui::Rect {
    if natural.width == 0 || natural.height == 0 {
        return egui::Rect::from_center_size(container.center(), egui::Vec2::ZERO);
    }
    let image = natural.to_vec2();
    let avail = (container.size() - egui::vec2(padding, padding)).max(egui::Vec2::ZERO);
    let scale = (avail.x / image.x).min(avail.y / image.y);
    let size = (image * scale).floor();
    egui::Rect::from_center_size(container.center(), size)
}

/// Screen position to normalized image space, measured against the
/// on-screen (zoomed, panned) image rect. Not clamped.
pub fn screen_to_normalized(pos: egui::Pos2, screen_rect: egui::Rect) -> egui::Pos2 {
    let size = screen_rect.size();
    if size.x <= 0.0 || size.y <= 0.0 {
        return egui::Pos2::ZERO;
    }
    let rel = (pos - screen_rect.min) / size;
    egui::pos2(rel.x, rel.y)
}

pub fn normalized_to_screen(pos: egui::Pos2, screen_rect: egui::Rect) -> egui::Pos2 {
    screen_rect.min + pos.to_vec2() * screen_rect.size()
}

/// Rule-of-thirds overlay drawn inside the crop box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    /// RGBA, unmultiplied.
    pub color: [u8; 4],
    /// Line thickness in screen pixels.
    pub thickness: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            show: true,
            color: [255, 255, 255, 180],
            thickness: 1.0,
        }
    }
}

impl GridConfig {
    pub fn color32(&self) -> egui::Color32 {
        let [r, g, b, a] = self.color;
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

/// The two vertical and two horizontal third-lines of `rect`, as segments.
pub fn grid_lines(rect: egui::Rect) -> [[egui::Pos2; 2]; 4] {
    let x1 = rect.min.x + rect.width() / 3.0;
    let x2 = rect.min.x + rect.width() * 2.0 / 3.0;
    let y1 = rect.min.y + rect.height() / 3.0;
    let y2 = rect.min.y + rect.height() * 2.0 / 3.0;
    [
        [egui::pos2(x1, rect.min.y), egui::pos2(x1, rect.max.y)],
        [egui::pos2(x2, rect.min.y), egui::pos2(x2, rect.max.y)],
        [egui::pos2(rect.min.x, y1), egui::pos2(rect.max.x, y1)],
        [egui::pos2(rect.min.x, y2), egui::pos2(rect.max.x, y2)],
    ]
}
