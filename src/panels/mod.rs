mod central_panel;
mod controls_panel;
mod inputs_panel;

pub use central_panel::central_panel;
pub use controls_panel::controls_panel;
pub use inputs_panel::inputs_panel;

use crate::StylizeApp;
use crate::app::StatusKind;

pub fn status_bar(app: &mut StylizeApp, ctx: &egui::Context) {
    let Some(status) = &app.status else {
        return;
    };
    let color = match status.kind {
        StatusKind::Info => ctx.style().visuals.text_color(),
        StatusKind::Error => ctx.style().visuals.error_fg_color,
    };
    let text = status.text.clone();

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.colored_label(color, text);
            if ui.small_button("✕").clicked() {
                app.status = None;
            }
        });
    });
}
