//! One open image and everything the editor knows about it.
//!
//! The session owns the crop, the viewport and the in-flight gesture. The
//! front end forwards raw pointer, key and wheel input and draws whatever
//! the session reports; it never touches crop or viewport math itself.

use eframe::egui;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, info, warn};

use crate::adjust::{AdjustmentSettings, FilterPreset};
use crate::aspect::AspectRatioMode;
use crate::bake::bake;
use crate::config::EditorConfig;
use crate::crop::{Axis, CropRect, ImageSize, PixelRect};
use crate::error::{EditorError, Result};
use crate::export::{self, EncodedImage, ExportOptions};
use crate::processor::ImageProcessor;
use crate::resize::{DragHandle, DragSession, hit_test};
use crate::viewport::{self, ViewportState};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    None,
    #[default]
    Crop,
    Adjust,
    AiEdit,
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tool::None => "View",
            Tool::Crop => "Crop",
            Tool::Adjust => "Adjust",
            Tool::AiEdit => "AI Edit",
        };
        write!(f, "{}", s)
    }
}

/// The gesture in flight between pointer-down and pointer-up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging(DragSession),
    Panning {
        /// Screen position at pointer-down.
        start_pointer: egui::Pos2,
        start_pan: egui::Vec2,
    },
}

struct LoadedImage {
    source: RgbaImage,
    natural: ImageSize,
    preview: Option<RgbaImage>,
}

pub struct CropEditorSession {
    config: EditorConfig,
    image: Option<LoadedImage>,
    crop: CropRect,
    viewport: ViewportState,
    container: egui::Rect,
    interaction: Interaction,
    space_held: bool,
    tool: Tool,
    aspect: AspectRatioMode,
    adjustments: AdjustmentSettings,
    revision: u64,
}

impl Default for CropEditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl CropEditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            image: None,
            crop: CropRect::default(),
            viewport: ViewportState::default(),
            container: egui::Rect::NOTHING,
            interaction: Interaction::Idle,
            space_held: false,
            tool: Tool::default(),
            aspect: AspectRatioMode::default(),
            adjustments: AdjustmentSettings::default(),
            revision: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    // ---- load lifecycle ----

    /// Decodes and adopts `bytes`. On failure nothing changes.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<ImageSize> {
        let decoded = image::load_from_memory(bytes).map_err(EditorError::Decode)?;
        Ok(self.load_image(decoded))
    }

    /// Adopts a decoded image: default crop (re-fitted to a locked ratio),
    /// fit-to-view, default adjustments.
    pub fn load_image(&mut self, image: DynamicImage) -> ImageSize {
        let source = image.to_rgba8();
        let natural = ImageSize::new(source.width(), source.height());
        self.image = Some(LoadedImage {
            source,
            natural,
            preview: None,
        });
        self.adjustments = AdjustmentSettings::default();
        self.crop = match self.ratio() {
            Some(ratio) => CropRect::default().fit_aspect(ratio),
            None => CropRect::default(),
        };
        self.viewport.reset();
        self.interaction = Interaction::Idle;
        self.revision += 1;
        info!(width = natural.width, height = natural.height, "image loaded");
        natural
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn natural_size(&self) -> Option<ImageSize> {
        self.image.as_ref().map(|i| i.natural)
    }

    /// Bumped whenever the previewed pixels change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ---- crop model ----

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    pub fn set_crop(&mut self, crop: CropRect) {
        self.crop = crop.clamped();
    }

    pub fn crop_pixels(&self) -> Option<PixelRect> {
        self.natural_size().map(|n| self.crop.to_pixels(n))
    }

    pub fn set_crop_pixel_width(&mut self, px: f32) {
        if let Some(natural) = self.natural_size() {
            self.crop = self.crop.with_pixel_width(px, natural, self.ratio());
        }
    }

    pub fn set_crop_pixel_height(&mut self, px: f32) {
        if let Some(natural) = self.natural_size() {
            self.crop = self.crop.with_pixel_height(px, natural, self.ratio());
        }
    }

    pub fn set_crop_pixel_position(&mut self, axis: Axis, px: f32) {
        if let Some(natural) = self.natural_size() {
            self.crop = self.crop.with_pixel_position(axis, px, natural);
        }
    }

    pub fn aspect(&self) -> AspectRatioMode {
        self.aspect
    }

    /// Locks (or frees) the ratio and re-fits the current crop to it.
    pub fn set_aspect(&mut self, mode: AspectRatioMode) {
        self.aspect = mode;
        if let Some(ratio) = self.ratio() {
            self.crop = self.crop.fit_aspect(ratio);
        }
        debug!(aspect = %mode, "aspect changed");
    }

    pub fn swap_aspect_orientation(&mut self) {
        self.set_aspect(self.aspect.counterpart());
    }

    /// Locked ratio in normalized crop units.
    pub fn ratio(&self) -> Option<f32> {
        self.natural_size()
            .and_then(|n| self.aspect.normalized_ratio(n))
    }

    // ---- adjustments ----

    pub fn adjustments(&self) -> AdjustmentSettings {
        self.adjustments
    }

    pub fn set_adjustments(&mut self, adjustments: AdjustmentSettings) {
        let adjustments = adjustments.clamped();
        if adjustments != self.adjustments {
            self.adjustments = adjustments;
            self.invalidate_preview();
        }
    }

    pub fn apply_preset(&mut self, preset: FilterPreset) {
        self.set_adjustments(self.adjustments.with_preset(preset));
    }

    pub fn rotate_quarter(&mut self, clockwise: bool) {
        let mut adj = self.adjustments;
        adj.rotate_quarter(clockwise);
        self.set_adjustments(adj);
    }

    pub fn reset_adjustments(&mut self) {
        self.set_adjustments(AdjustmentSettings::default());
    }

    fn invalidate_preview(&mut self) {
        if let Some(image) = &mut self.image {
            image.preview = None;
        }
        self.revision += 1;
    }

    // ---- tools and view ----

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// The screen area the image is laid out in.
    pub fn set_container(&mut self, container: egui::Rect) {
        self.container = container;
    }

    pub fn fit_rect(&self) -> Option<egui::Rect> {
        let natural = self.natural_size()?;
        if !self.container.is_positive() {
            return None;
        }
        Some(viewport::fit_rect(
            self.container,
            natural,
            self.config.display_padding,
        ))
    }

    /// Where the (zoomed, panned) image is drawn.
    pub fn screen_rect(&self) -> Option<egui::Rect> {
        self.fit_rect().map(|fit| self.viewport.screen_rect(fit))
    }

    pub fn crop_screen_rect(&self) -> Option<egui::Rect> {
        self.screen_rect().map(|r| self.crop.to_screen(r))
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in(self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out(self.config.zoom_step);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    /// `delta_y > 0` scrolls down and zooms out.
    pub fn wheel(&mut self, delta_y: f32) {
        self.viewport
            .wheel(delta_y, self.config.wheel_zoom_sensitivity);
    }

    // ---- pointer state machine ----

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn set_space_held(&mut self, held: bool) {
        self.space_held = held;
    }

    pub fn space_held(&self) -> bool {
        self.space_held
    }

    /// Crop handle under a screen position, if crop handles are armed.
    pub fn hit_test(&self, pos: egui::Pos2) -> Option<DragHandle> {
        if self.tool != Tool::Crop {
            return None;
        }
        let crop_rect = self.crop_screen_rect()?;
        hit_test(
            pos,
            crop_rect,
            self.config.handle_hit_tolerance,
            self.ratio().is_some(),
        )
    }

    /// Starts a pan or a crop drag. Returns whether a gesture began.
    /// Ignored while another gesture is running.
    pub fn pointer_down(&mut self, pos: egui::Pos2, button: egui::PointerButton) -> bool {
        if self.interaction != Interaction::Idle {
            return false;
        }
        let Some(screen) = self.screen_rect() else {
            return false;
        };

        if self.space_held || button == egui::PointerButton::Middle {
            self.interaction = Interaction::Panning {
                start_pointer: pos,
                start_pan: self.viewport.pan,
            };
            debug!("pan started");
            return true;
        }

        if button != egui::PointerButton::Primary {
            return false;
        }
        match self.hit_test(pos) {
            Some(handle) => {
                let start = viewport::screen_to_normalized(pos, screen);
                self.interaction = Interaction::Dragging(DragSession::new(handle, start, self.crop));
                debug!(?handle, "crop drag started");
                true
            }
            None => false,
        }
    }

    pub fn pointer_move(&mut self, pos: egui::Pos2) {
        match self.interaction {
            Interaction::Idle => {}
            Interaction::Dragging(drag) => {
                if let Some(screen) = self.screen_rect() {
                    let pointer = viewport::screen_to_normalized(pos, screen);
                    self.crop = drag.update(pointer, self.ratio());
                }
            }
            Interaction::Panning {
                start_pointer,
                start_pan,
            } => {
                self.viewport.pan = start_pan + (pos - start_pointer);
            }
        }
    }

    /// Ends any gesture. The crop keeps whatever value it had.
    pub fn pointer_up(&mut self) {
        if self.interaction != Interaction::Idle {
            debug!(crop = ?self.crop, "gesture ended");
        }
        self.interaction = Interaction::Idle;
    }

    pub fn cursor_icon(&self, pos: egui::Pos2) -> egui::CursorIcon {
        match self.interaction {
            Interaction::Panning { .. } => egui::CursorIcon::Grabbing,
            Interaction::Dragging(drag) => drag.handle.cursor(),
            Interaction::Idle if self.space_held => egui::CursorIcon::Grab,
            Interaction::Idle => self
                .hit_test(pos)
                .map_or(egui::CursorIcon::Default, |h| h.cursor()),
        }
    }

    // ---- baking and export ----

    /// Baked preview at native resolution, cached until adjustments change.
    pub fn preview(&mut self) -> Result<&RgbaImage> {
        let adjustments = self.adjustments;
        let image = self.image.as_mut().ok_or(EditorError::NoRenderSurface)?;
        if image.preview.is_none() {
            image.preview = Some(bake(&image.source, &adjustments));
        }
        image.preview.as_ref().ok_or(EditorError::NoRenderSurface)
    }

    /// Encodes the current crop without replacing the working image.
    pub fn export(&mut self, options: &ExportOptions) -> Result<EncodedImage> {
        let crop = self.crop;
        let baked = self.preview()?;
        export::export(baked, &crop, options)
    }

    /// Bakes, slices and encodes the crop, then loads the result as the
    /// new working image. Any failure leaves the session as it was.
    pub fn commit_crop(&mut self, options: &ExportOptions) -> Result<EncodedImage> {
        let encoded = match self.export(options) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "crop commit aborted");
                return Err(err);
            }
        };
        let size = self.load_bytes(&encoded.bytes)?;
        info!(
            width = size.width,
            height = size.height,
            format = %encoded.format,
            "crop committed"
        );
        Ok(encoded)
    }

    /// Sends the baked full frame to `processor` and adopts what comes back.
    pub fn submit_to(
        &mut self,
        processor: &dyn ImageProcessor,
        prompt: &str,
        options: &ExportOptions,
    ) -> Result<ImageSize> {
        let baked = self.preview()?;
        let encoded = export::encode(baked, options)?;
        let bytes = processor
            .process(&encoded, prompt)
            .map_err(|err| EditorError::Processor(err.to_string()))?;
        let size = self.load_bytes(&bytes)?;
        info!(prompt, "applied processed image");
        Ok(size)
    }
}
