#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::Path;

use crop_studio::crop::Axis;
use crop_studio::logging;
use crop_studio::resize::DragHandle;
use crop_studio::viewport::grid_lines;
use crop_studio::{
    AdjustmentSettings, AspectRatioMode, CropEditorSession, EditorConfig, EditorError,
    ExportFormat, FilterPreset, Tool,
};
use eframe::egui;
use tracing::{info, warn};

const OPEN_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// AI editing needs an `ImageProcessor`; the desktop build ships none.
const SELECTABLE_TOOLS: [Tool; 3] = [Tool::None, Tool::Crop, Tool::Adjust];

struct CropStudio {
    session: CropEditorSession,
    texture: Option<egui::TextureHandle>,
    texture_revision: u64,
    custom_w: u32,
    custom_h: u32,
    status: Option<String>,
}

impl CropStudio {
    fn new(_cc: &eframe::CreationContext<'_>, config: EditorConfig) -> Self {
        Self {
            session: CropEditorSession::new(config),
            texture: None,
            texture_revision: 0,
            custom_w: 4,
            custom_h: 3,
            status: None,
        }
    }

    fn open_path(&mut self, path: &Path) {
        let result = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| self.session.load_bytes(&bytes).map_err(|e| e.to_string()));
        match result {
            Ok(size) => {
                info!(path = %path.display(), "opened");
                self.status = Some(format!("{} x {}", size.width, size.height));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to open image");
                self.status = Some(format!("Failed to open image: {}", e));
            }
        }
    }

    fn save_export(&mut self) {
        let options = self.session.config().export;
        let encoded = match self.session.export(&options) {
            Ok(encoded) => encoded,
            Err(EditorError::NoRenderSurface) => return,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        let ext = options.format.extension();
        let Some(path) = rfd::FileDialog::new()
            .add_filter(options.format.to_string(), &[ext])
            .set_file_name(format!("cropped.{}", ext))
            .save_file()
        else {
            return;
        };
        if let Err(e) = std::fs::write(&path, &encoded.bytes) {
            warn!(path = %path.display(), error = %e, "failed to save image");
            self.status = Some(format!("Failed to save image: {}", e));
        } else {
            self.status = Some(format!("Saved {}", path.display()));
        }
    }

    fn apply_crop(&mut self) {
        let options = self.session.config().export;
        match self.session.commit_crop(&options) {
            Ok(_) => {
                if let Some(size) = self.session.natural_size() {
                    self.status = Some(format!("Cropped to {} x {}", size.width, size.height));
                }
            }
            Err(EditorError::NoRenderSurface) => {}
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.session.config().save() {
            warn!(error = %e, "failed to save config");
        }
    }

    /// Re-uploads the baked preview when the session reports new pixels.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() && self.texture_revision == self.session.revision() {
            return;
        }
        let revision = self.session.revision();
        match self.session.preview() {
            Ok(baked) => {
                let size = [baked.width() as _, baked.height() as _];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, baked.as_raw());
                match &mut self.texture {
                    Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR))
                    }
                }
                self.texture_revision = revision;
            }
            Err(_) => self.texture = None,
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", &OPEN_EXTENSIONS)
                    .pick_file()
                {
                    self.open_path(&path);
                }
            }

            let has_image = self.session.has_image();
            if ui.add_enabled(has_image, egui::Button::new("Save…")).clicked() {
                self.save_export();
            }

            let mut export = self.session.config().export;
            egui::ComboBox::from_id_salt("export_format")
                .selected_text(export.format.to_string())
                .show_ui(ui, |ui| {
                    for format in ExportFormat::ALL {
                        ui.selectable_value(&mut export.format, format, format.to_string());
                    }
                });
            if export.format == ExportFormat::Jpeg {
                ui.add(egui::Slider::new(&mut export.quality, 0.0..=1.0).text("Quality"));
            }
            if export != self.session.config().export {
                self.session.config_mut().export = export;
                self.save_config();
            }

            ui.separator();
            ui.add_enabled_ui(has_image, |ui| {
                if ui.button("−").clicked() {
                    self.session.zoom_out();
                }
                ui.label(format!("{}%", self.session.viewport().percent()));
                if ui.button("+").clicked() {
                    self.session.zoom_in();
                }
                if ui.button("Reset").clicked() {
                    self.session.reset_view();
                }
            });

            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status);
            }
        });
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for tool in SELECTABLE_TOOLS {
                if ui
                    .selectable_label(self.session.tool() == tool, tool.to_string())
                    .clicked()
                {
                    self.session.set_tool(tool);
                }
            }
        });
        ui.separator();

        match self.session.tool() {
            Tool::Crop => self.crop_controls(ui),
            Tool::Adjust => self.adjust_controls(ui),
            Tool::None | Tool::AiEdit => {
                ui.label("Hold Space or use the middle button to pan.");
            }
        }
    }

    fn crop_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Aspect Ratio:");
            let current = self.session.aspect();
            let mut selected = current;
            egui::ComboBox::from_id_salt("params_aspect_ratio")
                .selected_text(current.to_string())
                .show_ui(ui, |ui| {
                    for mode in [
                        AspectRatioMode::Free,
                        AspectRatioMode::Original,
                        AspectRatioMode::Square,
                    ] {
                        ui.selectable_value(&mut selected, mode, mode.to_string());
                    }
                    ui.separator();
                    let presets = if current.is_portrait() {
                        AspectRatioMode::PORTRAIT
                    } else {
                        AspectRatioMode::LANDSCAPE
                    };
                    for mode in presets {
                        ui.selectable_value(&mut selected, mode, mode.to_string());
                    }
                    ui.separator();
                    let custom = AspectRatioMode::Custom {
                        w: self.custom_w,
                        h: self.custom_h,
                    };
                    ui.selectable_value(&mut selected, custom, "Custom");
                });
            if selected != current {
                self.session.set_aspect(selected);
            }
            if ui.button("🔄").on_hover_text("Swap orientation").clicked() {
                self.session.swap_aspect_orientation();
            }
        });

        if let AspectRatioMode::Custom { w, h } = self.session.aspect() {
            self.custom_w = w;
            self.custom_h = h;
            let mut changed = false;
            ui.horizontal(|ui| {
                changed |= ui
                    .add(egui::DragValue::new(&mut self.custom_w).speed(0.1).range(1..=100))
                    .changed();
                ui.label(":");
                changed |= ui
                    .add(egui::DragValue::new(&mut self.custom_h).speed(0.1).range(1..=100))
                    .changed();
            });
            if changed {
                self.session.set_aspect(AspectRatioMode::Custom {
                    w: self.custom_w,
                    h: self.custom_h,
                });
            }
        }

        if let Some(px) = self.session.crop_pixels() {
            let (mut x, mut y) = (px.x, px.y);
            let (mut w, mut h) = (px.width, px.height);
            egui::Grid::new("crop_numeric").num_columns(4).show(ui, |ui| {
                ui.label("X");
                if ui.add(egui::DragValue::new(&mut x)).changed() {
                    self.session.set_crop_pixel_position(Axis::X, x as f32);
                }
                ui.label("Y");
                if ui.add(egui::DragValue::new(&mut y)).changed() {
                    self.session.set_crop_pixel_position(Axis::Y, y as f32);
                }
                ui.end_row();
                ui.label("W");
                if ui.add(egui::DragValue::new(&mut w)).changed() {
                    self.session.set_crop_pixel_width(w as f32);
                }
                ui.label("H");
                if ui.add(egui::DragValue::new(&mut h)).changed() {
                    self.session.set_crop_pixel_height(h as f32);
                }
                ui.end_row();
            });
        }

        let mut show_grid = self.session.config().grid.show;
        if ui.checkbox(&mut show_grid, "Rule of thirds").changed() {
            self.session.config_mut().grid.show = show_grid;
            self.save_config();
        }

        ui.separator();
        if ui
            .add_enabled(self.session.has_image(), egui::Button::new("Apply Crop"))
            .clicked()
        {
            self.apply_crop();
        }
    }

    fn adjust_controls(&mut self, ui: &mut egui::Ui) {
        let mut adj = self.session.adjustments();

        ui.horizontal(|ui| {
            if ui.button("⟲ 90°").clicked() {
                adj.rotate_quarter(false);
            }
            if ui.button("⟳ 90°").clicked() {
                adj.rotate_quarter(true);
            }
            ui.checkbox(&mut adj.flip_x, "Flip H");
            ui.checkbox(&mut adj.flip_y, "Flip V");
        });
        ui.add(egui::Slider::new(&mut adj.rotation, AdjustmentSettings::ROTATION_RANGE).text("Rotation").suffix("°"));
        ui.add(egui::Slider::new(&mut adj.brightness, AdjustmentSettings::PERCENT_RANGE).text("Brightness").suffix("%"));
        ui.add(egui::Slider::new(&mut adj.contrast, AdjustmentSettings::PERCENT_RANGE).text("Contrast").suffix("%"));
        ui.add(egui::Slider::new(&mut adj.saturation, AdjustmentSettings::PERCENT_RANGE).text("Saturation").suffix("%"));
        ui.add(egui::Slider::new(&mut adj.warmth, AdjustmentSettings::WARMTH_RANGE).text("Warmth"));
        ui.add(egui::Slider::new(&mut adj.blur, AdjustmentSettings::BLUR_RANGE).text("Blur").suffix(" px"));

        self.session.set_adjustments(adj);

        ui.separator();
        ui.label("Presets");
        ui.horizontal_wrapped(|ui| {
            for preset in FilterPreset::ALL {
                if ui.button(preset.to_string()).clicked() {
                    self.session.apply_preset(preset);
                }
            }
        });
        if ui.button("Reset adjustments").clicked() {
            self.session.reset_adjustments();
        }
    }

    /// Forwards raw input over the canvas to the session.
    fn handle_canvas_input(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let typing = ui.ctx().wants_keyboard_input();
        let (space, pressed, released, pointer, scroll) = ui.input(|i| {
            let pressed = [egui::PointerButton::Primary, egui::PointerButton::Middle]
                .into_iter()
                .find(|b| i.pointer.button_pressed(*b));
            (
                i.key_down(egui::Key::Space),
                pressed,
                i.pointer.any_released(),
                i.pointer.latest_pos(),
                i.raw_scroll_delta.y,
            )
        });

        self.session.set_space_held(space && !typing);

        if let (Some(button), Some(pos)) = (pressed, pointer) {
            if response.hovered() {
                self.session.pointer_down(pos, button);
            }
        }
        if let Some(pos) = pointer {
            self.session.pointer_move(pos);
        }
        if released {
            self.session.pointer_up();
        }
        // egui scrolls up with positive y; the session expects the opposite.
        if response.hovered() && scroll != 0.0 {
            self.session.wheel(-scroll);
        }
        if let Some(pos) = response.hover_pos() {
            ui.ctx().set_cursor_icon(self.session.cursor_icon(pos));
        }
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let canvas = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(canvas, egui::Sense::click_and_drag());
        self.session.set_container(canvas);
        self.handle_canvas_input(ui, &response);

        let (Some(texture), Some(image_rect), Some(screen_crop_rect)) = (
            &self.texture,
            self.session.screen_rect(),
            self.session.crop_screen_rect(),
        ) else {
            ui.painter_at(canvas).text(
                canvas.center(),
                egui::Align2::CENTER_CENTER,
                "Open or drop an image",
                egui::FontId::proportional(18.0),
                ui.visuals().weak_text_color(),
            );
            return;
        };

        let painter = ui.painter_at(canvas);
        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        if self.session.tool() != Tool::Crop {
            return;
        }

        // Dim everything outside the crop.
        let overlay_color = egui::Color32::from_black_alpha(150);
        let bands = [
            egui::Rect::from_min_max(image_rect.min, egui::pos2(image_rect.max.x, screen_crop_rect.min.y)),
            egui::Rect::from_min_max(egui::pos2(image_rect.min.x, screen_crop_rect.max.y), image_rect.max),
            egui::Rect::from_min_max(
                egui::pos2(image_rect.min.x, screen_crop_rect.min.y),
                egui::pos2(screen_crop_rect.min.x, screen_crop_rect.max.y),
            ),
            egui::Rect::from_min_max(
                egui::pos2(screen_crop_rect.max.x, screen_crop_rect.min.y),
                egui::pos2(image_rect.max.x, screen_crop_rect.max.y),
            ),
        ];
        for band in bands {
            painter.rect_filled(band, 0.0, overlay_color);
        }

        let grid = self.session.config().grid;
        if grid.show {
            let stroke = egui::Stroke::new(grid.thickness, grid.color32());
            for line in grid_lines(screen_crop_rect) {
                painter.line_segment(line, stroke);
            }
        }

        painter.rect_stroke(screen_crop_rect, 0.0, egui::Stroke::new(1.0, egui::Color32::WHITE));

        let handle_radius = 6.0;
        let handle_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
        let handle_fill = egui::Color32::WHITE;
        let ratio_locked = self.session.ratio().is_some();
        for handle in DragHandle::CORNERS
            .into_iter()
            .chain(DragHandle::EDGES.into_iter().filter(|_| !ratio_locked))
        {
            painter.circle(handle.position(screen_crop_rect), handle_radius, handle_fill, handle_stroke);
        }
    }
}

impl eframe::App for CropStudio {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open_path(&path);
        }

        self.sync_texture(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.top_bar(ui));
        egui::SidePanel::right("controls")
            .min_width(240.0)
            .show(ctx, |ui| self.side_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui));
    }
}

fn main() -> eframe::Result {
    logging::init();
    let config = EditorConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Crop Studio",
        options,
        Box::new(|cc| Ok(Box::new(CropStudio::new(cc, config)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ai_edit_is_not_offered_without_a_processor() {
        assert!(!SELECTABLE_TOOLS.contains(&Tool::AiEdit));
        assert!(SELECTABLE_TOOLS.contains(&Tool::default()));
    }
}
