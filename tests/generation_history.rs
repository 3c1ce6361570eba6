use eframe_stylize::export::{export_all, export_file_name};
use eframe_stylize::generation::{
    GeneratedImage, GenerationHistory, GenerationOutcome, SlotState, SlotUpdate,
};
use eframe_stylize::raster::RasterSnapshot;
use image::RgbaImage;

fn generated(width: u32) -> GeneratedImage {
    GeneratedImage::new(RasterSnapshot::from_image(RgbaImage::new(width, width)), None)
}

#[test]
fn test_pending_slot_is_viewed_immediately() {
    let mut history = GenerationHistory::restore(vec![generated(1), generated(2)], 0);
    history.reserve_pending();

    assert_eq!(history.len(), 3);
    assert_eq!(history.current_index(), 2);
    assert!(history.current().is_some_and(|slot| slot.is_pending()));
    assert!(history.has_pending());
}

#[test]
fn test_success_replaces_pending_slot_in_place() {
    let mut history = GenerationHistory::restore(vec![generated(1)], 0);
    let ticket = history.reserve_pending();
    let result = generated(8);

    assert_eq!(
        history.resolve(ticket, GenerationOutcome::Success(result.clone())),
        SlotUpdate::Replaced(1)
    );
    assert_eq!(history.len(), 2);
    assert!(!history.has_pending());
    assert_eq!(history.get(1).map(|slot| slot.state()), Some(&SlotState::Ready(result)));
}

#[test]
fn test_failure_removes_slot_and_steps_back() {
    let mut history = GenerationHistory::restore(vec![generated(1), generated(2)], 0);
    let ticket = history.reserve_pending();

    assert_eq!(
        history.resolve(ticket, GenerationOutcome::Failure("Request blocked: SAFETY".to_owned())),
        SlotUpdate::Removed(2)
    );
    assert_eq!(history.len(), 2);
    assert_eq!(history.current_index(), 1);
    assert!(!history.has_pending());
}

#[test]
fn test_first_failure_leaves_empty_history() {
    let mut history = GenerationHistory::new();
    let ticket = history.reserve_pending();
    history.resolve(ticket, GenerationOutcome::Failure("no image".to_owned()));

    assert!(history.is_empty());
    assert_eq!(history.current_index(), 0);
    assert!(history.current().is_none());
}

#[test]
fn test_resolving_twice_is_unknown() {
    let mut history = GenerationHistory::new();
    let ticket = history.reserve_pending();
    history.resolve(ticket, GenerationOutcome::Failure("boom".to_owned()));

    assert_eq!(
        history.resolve(ticket, GenerationOutcome::Success(generated(1))),
        SlotUpdate::Unknown
    );
    assert!(history.is_empty());
}

#[test]
fn test_ready_images_skip_pending() {
    let mut history = GenerationHistory::restore(vec![generated(1), generated(2)], 1);
    history.reserve_pending();
    assert_eq!(history.ready_images().count(), 2);
}

#[test]
fn test_export_numbers_ready_images() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = GenerationHistory::restore(vec![generated(3), generated(5)], 0);
    history.reserve_pending();

    let written = export_all(dir.path(), &history).unwrap();
    assert_eq!(written.len(), 2);
    assert!(dir.path().join(export_file_name(1)).is_file());
    assert!(dir.path().join("styled-image-2.png").is_file());
    assert!(!dir.path().join("styled-image-3.png").exists());
}

#[test]
fn test_export_with_nothing_ready_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = GenerationHistory::new();
    history.reserve_pending();
    assert!(export_all(dir.path(), &history).is_err());
}
