use egui::vec2;

use crate::StylizeApp;
use crate::state::EditAction;
use crate::tools::{MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, ToolKind};

pub fn controls_panel(app: &mut StylizeApp, ctx: &egui::Context) {
    egui::SidePanel::right("controls_panel")
        .resizable(true)
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("Prompt");
            ui.add(
                egui::TextEdit::multiline(&mut app.prompt)
                    .hint_text("Describe a style, or changes to make")
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );
            ui.label("Negative prompt");
            ui.add(
                egui::TextEdit::multiline(&mut app.negative_prompt)
                    .hint_text("Things to avoid")
                    .desired_rows(2)
                    .desired_width(f32::INFINITY),
            );

            ui.separator();
            edit_toolbar(app, ui);

            ui.separator();
            let label = if app.is_busy() {
                "Generating…"
            } else if app.session.is_active() {
                "Generate from edit"
            } else {
                "Generate"
            };
            let button = egui::Button::new(label).min_size(vec2(ui.available_width(), 32.0));
            if ui.add_enabled(app.can_generate(), button).clicked() {
                app.generate(ctx);
            }
            if app.is_busy() {
                ui.spinner();
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    app.save_now();
                }
                if ui
                    .add_enabled(!app.generated.is_empty(), egui::Button::new("Reset"))
                    .on_hover_text("Clear all generated images")
                    .clicked()
                {
                    app.reset();
                }
            });

            ui.label("Export folder");
            ui.text_edit_singleline(&mut app.export_dir);
            let has_results = app.generated.ready_images().next().is_some();
            if ui.add_enabled(has_results, egui::Button::new("Export all")).clicked() {
                app.export_all();
            }
        });
}

fn edit_toolbar(app: &mut StylizeApp, ui: &mut egui::Ui) {
    ui.heading("Edit");
    let editing = app.session.is_active();
    if ui.button(if editing { "Cancel edit" } else { "Edit image" }).clicked() {
        app.toggle_edit();
    }
    if !app.session.is_active() {
        return;
    }

    ui.horizontal(|ui| {
        for tool in ToolKind::ALL {
            if ui.selectable_label(app.session.tools.tool == tool, tool.name()).clicked() {
                log::info!("Tool selected from UI: {}", tool.name());
                app.session.tools.tool = tool;
            }
        }
    });

    let mut size = app.session.tools.brush_size();
    if ui
        .add(egui::Slider::new(&mut size, MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE).text("Size"))
        .changed()
    {
        app.session.tools.set_brush_size(size);
    }

    if app.session.tools.tool == ToolKind::Brush {
        ui.horizontal(|ui| {
            ui.label("Color");
            egui::color_picker::color_edit_button_srgba(
                ui,
                &mut app.session.tools.brush_color,
                egui::color_picker::Alpha::OnlyBlend,
            );
        });
    }

    ui.horizontal(|ui| {
        if ui.add_enabled(app.session.can_undo(), egui::Button::new("Undo")).clicked() {
            app.apply_edit(EditAction::Undo);
        }
        if ui.add_enabled(app.session.can_redo(), egui::Button::new("Redo")).clicked() {
            app.apply_edit(EditAction::Redo);
        }
    });
}
