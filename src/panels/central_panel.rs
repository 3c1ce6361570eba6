use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2, pos2, vec2};

use crate::StylizeApp;
use crate::file_handler::ImageTarget;
use crate::generation::{Direction, SlotState};
use crate::geometry::{CoordinateMapper, fit_centered};
use crate::raster::RasterSnapshot;
use crate::state::{ActiveEdit, EditAction};

const FULL_UV: Rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));

pub fn central_panel(app: &mut StylizeApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        if !app.generated.is_empty() {
            navigator(app, ui);
            ui.separator();
        }

        let available = ui.available_rect_before_wrap();
        if app.session.is_active() {
            edit_canvas(app, ui, available);
        } else {
            result_view(app, ui, available);
        }
    });
}

fn navigator(app: &mut StylizeApp, ui: &mut egui::Ui) {
    let index = app.generated.current_index();
    let count = app.generated.len();
    let viewed = app.generated.current().and_then(|slot| slot.image()).cloned();

    ui.horizontal(|ui| {
        if ui.add_enabled(index > 0, egui::Button::new("◀")).clicked() {
            app.navigate(Direction::Previous);
        }
        ui.label(format!("{} / {}", index + 1, count));
        if ui.add_enabled(index + 1 < count, egui::Button::new("▶")).clicked() {
            app.navigate(Direction::Next);
        }

        ui.separator();
        let has_before = viewed.as_ref().is_some_and(|image| image.before.is_some());
        ui.add_enabled(has_before, egui::Checkbox::new(&mut app.show_before, "Show before"));

        if viewed.is_some() {
            if ui.button("Use as content").clicked() {
                app.use_result_as(index, ImageTarget::Content);
            }
            if ui.button("Use as style").clicked() {
                app.use_result_as(index, ImageTarget::Style);
            }
            #[cfg(not(target_arch = "wasm32"))]
            if ui.button("Copy").clicked() {
                app.copy_result(index);
            }
        }
    });
}

fn result_view(app: &mut StylizeApp, ui: &mut egui::Ui, available: Rect) {
    let shown: Option<RasterSnapshot> = match app.generated.current().map(|slot| slot.state()) {
        Some(SlotState::Pending) => {
            ui.vertical_centered(|ui| {
                ui.add_space((available.height() / 2.0 - 24.0).max(0.0));
                ui.spinner();
                ui.label("Generating…");
            });
            return;
        }
        Some(SlotState::Ready(image)) => match (&image.before, app.show_before) {
            (Some(before), true) => Some(before.clone()),
            _ => Some(image.after.clone()),
        },
        None => app.content_image.clone(),
    };

    let Some(image) = shown else {
        ui.centered_and_justified(|ui| {
            ui.weak("Drop a content image, or describe an image and press Generate");
        });
        return;
    };

    let texture = app.textures.snapshot_texture(ui.ctx(), &image);
    let rect = fit_centered(available, image.size_vec2());
    ui.allocate_rect(available, Sense::hover());
    ui.painter().image(texture, rect, FULL_UV, Color32::WHITE);
}

fn edit_canvas(app: &mut StylizeApp, ui: &mut egui::Ui, available: Rect) {
    let Some(edit) = app.session.active() else {
        return;
    };
    let size = edit.buffer().size();
    let rect = fit_centered(available, vec2(size[0] as f32, size[1] as f32));
    let texture = app.textures.canvas_texture(ui.ctx(), edit.buffer(), edit.revision());

    let response = ui.allocate_rect(rect, Sense::drag());
    // Erased pixels show through to this backdrop
    ui.painter().rect_filled(rect, 0.0, Color32::from_gray(48));
    ui.painter().image(texture, rect, FULL_UV, Color32::WHITE);

    let mapper = CoordinateMapper::new(rect, size);
    let mut pointer = ui.input(CanvasPointer::read);
    // Presses on a popup above the canvas belong to the popup
    pointer.pressed &= response.contains_pointer();
    handle_canvas_input(app, pointer, &mapper);

    if let Some(hover) = response.hover_pos() {
        let radius = mapper.brush_preview_radius(app.session.tools.brush_size());
        ui.painter().circle_stroke(hover, radius, Stroke::new(1.5, Color32::WHITE));
        ui.painter().circle_stroke(hover, radius + 1.0, Stroke::new(1.0, Color32::BLACK));
        ui.ctx().set_cursor_icon(egui::CursorIcon::None);
    }
}

/// Primary-button pointer state for one frame
#[derive(Debug, Clone, Copy, Default)]
struct CanvasPointer {
    pressed: bool,
    released: bool,
    down: bool,
    moved: bool,
    pos: Option<Pos2>,
}

impl CanvasPointer {
    fn read(input: &egui::InputState) -> Self {
        Self {
            pressed: input.pointer.primary_pressed(),
            released: input.pointer.primary_released(),
            down: input.pointer.primary_down(),
            moved: input.pointer.delta() != Vec2::ZERO,
            pos: input.pointer.interact_pos(),
        }
    }
}

/// Turns one frame of pointer input over the canvas into session actions.
///
/// A press and its release can land in the same frame (quick clicks, touchpad
/// taps), so both are handled in one pass. The stroke also closes whenever the
/// button is no longer down, even if the release itself was never seen.
fn handle_canvas_input(app: &mut StylizeApp, pointer: CanvasPointer, mapper: &CoordinateMapper) {
    let over_canvas = pointer.pos.filter(|pos| mapper.surface().contains(*pos));

    if pointer.pressed {
        if let Some(pos) = over_canvas {
            app.apply_edit(EditAction::PointerDown(mapper.to_buffer(pos)));
        }
    }
    if !app.session.active().is_some_and(ActiveEdit::is_stroking) {
        return;
    }

    let Some(pos) = over_canvas else {
        app.apply_edit(EditAction::PointerLeave);
        return;
    };
    if pointer.moved && !pointer.pressed {
        app.apply_edit(EditAction::PointerMove(mapper.to_buffer(pos)));
    }
    if pointer.released || !pointer.down {
        app.apply_edit(EditAction::PointerUp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterSnapshot;
    use egui::{Event, Modifiers, PointerButton, RawInput};
    use image::{Rgba, RgbaImage};

    fn canvas_rect() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0))
    }

    fn editing_app() -> StylizeApp {
        let mut app = StylizeApp::default();
        let white = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let base = RasterSnapshot::from_image(white);
        app.set_image(ImageTarget::Content, Some(base));
        app.toggle_edit();
        assert!(app.session.is_active());
        app.session.tools.brush_color = Color32::RED;
        app
    }

    fn button(x: f32, y: f32, pressed: bool) -> Event {
        Event::PointerButton {
            pos: pos2(x, y),
            button: PointerButton::Primary,
            pressed,
            modifiers: Modifiers::NONE,
        }
    }

    fn run_frame(ctx: &egui::Context, app: &mut StylizeApp, events: Vec<Event>) {
        let mapper = CoordinateMapper::new(canvas_rect(), [100, 100]);
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, vec2(400.0, 400.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            let pointer = ctx.input(CanvasPointer::read);
            handle_canvas_input(app, pointer, &mapper);
        });
    }

    fn is_stroking(app: &StylizeApp) -> bool {
        app.session.active().is_some_and(ActiveEdit::is_stroking)
    }

    fn history_len(app: &StylizeApp) -> usize {
        app.session.history().map_or(0, |history| history.len())
    }

    fn revision(app: &StylizeApp) -> u64 {
        app.session.active().map_or(0, ActiveEdit::revision)
    }

    #[test]
    fn test_drag_across_frames_commits_one_stroke() {
        let ctx = egui::Context::default();
        let mut app = editing_app();

        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(10.0, 50.0))]);
        run_frame(&ctx, &mut app, vec![button(10.0, 50.0, true)]);
        assert!(is_stroking(&app));

        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(50.0, 50.0))]);
        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(90.0, 50.0))]);
        assert!(revision(&app) >= 2);

        run_frame(&ctx, &mut app, vec![button(90.0, 50.0, false)]);
        assert!(!is_stroking(&app));
        assert_eq!(history_len(&app), 2);
        assert!(app.session.can_undo());

        let painted = app.session.current_snapshot().and_then(|snapshot| snapshot.pixel(50, 50));
        assert_eq!(painted, Some(Color32::RED));
    }

    #[test]
    fn test_press_and_release_in_one_frame_closes_the_stroke() {
        let ctx = egui::Context::default();
        let mut app = editing_app();

        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(20.0, 20.0))]);
        run_frame(&ctx, &mut app, vec![button(20.0, 20.0, true), button(20.0, 20.0, false)]);
        assert!(!is_stroking(&app));
        assert_eq!(history_len(&app), 2);

        // Hovering with the button up must not paint
        let before = revision(&app);
        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(40.0, 40.0))]);
        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(60.0, 60.0))]);
        assert_eq!(revision(&app), before);
        assert_eq!(history_len(&app), 2);
        assert!(app.session.can_undo());
        assert_eq!(
            app.session.current_snapshot().and_then(|snapshot| snapshot.pixel(50, 50)),
            Some(Color32::WHITE)
        );
    }

    #[test]
    fn test_dragging_off_the_canvas_commits() {
        let ctx = egui::Context::default();
        let mut app = editing_app();

        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(50.0, 50.0))]);
        run_frame(&ctx, &mut app, vec![button(50.0, 50.0, true)]);
        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(80.0, 50.0))]);
        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(200.0, 50.0))]);
        assert!(!is_stroking(&app));
        assert_eq!(history_len(&app), 2);

        // Coming back with the button still held does not resume the stroke
        let after_leave = revision(&app);
        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(60.0, 60.0))]);
        assert!(!is_stroking(&app));
        assert_eq!(revision(&app), after_leave);
    }

    #[test]
    fn test_press_outside_the_canvas_is_ignored() {
        let ctx = egui::Context::default();
        let mut app = editing_app();

        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(150.0, 150.0))]);
        run_frame(&ctx, &mut app, vec![button(150.0, 150.0, true)]);
        run_frame(&ctx, &mut app, vec![Event::PointerMoved(pos2(50.0, 50.0))]);
        assert!(!is_stroking(&app));
        assert_eq!(history_len(&app), 1);
    }
}
