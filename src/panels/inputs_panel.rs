use egui::{Pos2, Rect, vec2};

use crate::StylizeApp;
use crate::file_handler::ImageTarget;
use crate::generation::{Resolution, STYLE_PRESETS};
use crate::geometry::fit_centered;

const THUMBNAIL_HEIGHT: f32 = 140.0;

pub fn inputs_panel(app: &mut StylizeApp, ctx: &egui::Context) {
    egui::SidePanel::left("inputs_panel")
        .resizable(true)
        .default_width(240.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Images");
                let content_rect = image_slot(app, ui, ImageTarget::Content);
                let style_rect = image_slot(app, ui, ImageTarget::Style);
                app.file_handler.set_drop_zones(content_rect, style_rect);

                ui.separator();
                ui.heading("Style");
                egui::Grid::new("style_presets")
                    .num_columns(2)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for (i, preset) in STYLE_PRESETS.iter().enumerate() {
                            let selected = app.selected_style.as_deref() == Some(preset.id);
                            if ui
                                .selectable_label(selected, preset.name)
                                .on_hover_text(preset.prompt)
                                .clicked()
                            {
                                app.toggle_style(preset.id);
                            }
                            if i % 2 == 1 {
                                ui.end_row();
                            }
                        }
                    });

                ui.separator();
                ui.heading("Resolution");
                for resolution in Resolution::ALL {
                    ui.radio_value(
                        &mut app.resolution,
                        resolution,
                        format!("{} ({})", resolution.label(), resolution.value()),
                    );
                }
            });
        });
}

/// One input slot: thumbnail or drop hint, plus a path field.
/// Returns the slot's rect as a drop zone.
fn image_slot(app: &mut StylizeApp, ui: &mut egui::Ui, target: ImageTarget) -> Rect {
    let (title, slot) = match target {
        ImageTarget::Content => ("Content image", 0),
        ImageTarget::Style => ("Style image", 1),
    };
    let image = match target {
        ImageTarget::Content => app.content_image.clone(),
        ImageTarget::Style => app.style_image.clone(),
    };

    let frame = egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.strong(title);

        match &image {
            Some(image) => {
                let texture = app.textures.snapshot_texture(ui.ctx(), image);
                let bounds =
                    Rect::from_min_size(Pos2::ZERO, vec2(ui.available_width(), THUMBNAIL_HEIGHT));
                let size = fit_centered(bounds, image.size_vec2()).size();
                ui.image((texture, size));
                ui.horizontal(|ui| {
                    ui.label(format!("{}×{}", image.width(), image.height()));
                    if ui.small_button("Remove").clicked() {
                        app.set_image(target, None);
                    }
                });
            }
            None => {
                ui.weak("Drop an image here");
            }
        }

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut app.path_inputs[slot])
                    .hint_text("path/to/image.png")
                    .desired_width(ui.available_width() - 48.0),
            );
            let has_path = !app.path_inputs[slot].trim().is_empty();
            if ui.add_enabled(has_path, egui::Button::new("Open")).clicked() {
                app.open_path(target);
            }
        });
    });

    frame.response.rect
}
