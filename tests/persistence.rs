use eframe_stylize::generation::{GeneratedImage, GenerationHistory, Resolution};
use eframe_stylize::raster::RasterSnapshot;
use eframe_stylize::state::{PersistenceError, SavedSession, StateStore};
use eframe_stylize::tools::ToolKind;
use image::{Rgba, RgbaImage};

fn image(width: u32, height: u32, shade: u8) -> RasterSnapshot {
    RasterSnapshot::from_image(RgbaImage::from_pixel(width, height, Rgba([shade, 0, 0, 255])))
}

fn sample_session() -> SavedSession {
    let mut generated = GenerationHistory::restore(
        vec![
            GeneratedImage::new(image(8, 8, 10), Some(image(8, 8, 20))),
            GeneratedImage::new(image(6, 4, 30), None),
        ],
        1,
    );
    generated.reserve_pending();

    let mut session = SavedSession {
        content_image: Some(image(12, 9, 40)),
        style_image: None,
        generated,
        prompt: "ink wash".to_owned(),
        negative_prompt: "text".to_owned(),
        selected_style: Some("vintage".to_owned()),
        resolution: Resolution::WideLandscape,
        ..Default::default()
    };
    session.tools.tool = ToolKind::Eraser;
    session.tools.set_brush_size(55.0);
    session
}

#[test]
fn test_missing_session_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StateStore::new(dir.path());
    assert!(store.load().unwrap().is_none());
}

#[test]
fn test_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let saved = sample_session();

    let mut store = StateStore::new(dir.path());
    store.save(&saved).unwrap();
    store.close();

    let mut reopened = StateStore::new(dir.path());
    let loaded = reopened.load().unwrap().unwrap();

    assert_eq!(loaded.prompt, "ink wash");
    assert_eq!(loaded.negative_prompt, "text");
    assert_eq!(loaded.selected_style.as_deref(), Some("vintage"));
    assert_eq!(loaded.resolution, Resolution::WideLandscape);
    assert_eq!(loaded.tools, saved.tools);
    assert!(loaded.style_image.is_none());

    let content = loaded.content_image.unwrap();
    assert_eq!(content.image(), saved.content_image.unwrap().image());

    // The pending slot is not persisted
    assert_eq!(loaded.generated.len(), 2);
    assert!(!loaded.generated.has_pending());
    assert_eq!(loaded.generated.current_index(), 1);

    let originals: Vec<_> = saved.generated.ready_images().collect();
    for (restored, original) in loaded.generated.ready_images().zip(originals) {
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.after.image(), original.after.image());
        assert_eq!(
            restored.before.as_ref().map(|b| b.image().clone()),
            original.before.as_ref().map(|b| b.image().clone())
        );
    }
}

#[test]
fn test_saving_again_drops_stale_images() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StateStore::new(dir.path());
    store.save(&sample_session()).unwrap();

    let empty = SavedSession::default();
    store.save(&empty).unwrap();

    let pngs = std::fs::read_dir(dir.path().join("images")).unwrap().count();
    assert_eq!(pngs, 0);

    let loaded = store.load().unwrap().unwrap();
    assert!(loaded.content_image.is_none());
    assert!(loaded.generated.is_empty());
}

#[test]
fn test_corrupt_manifest_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.json"), "{ not json").unwrap();

    let mut store = StateStore::new(dir.path());
    assert!(matches!(store.load(), Err(PersistenceError::SerializationError(_))));
}

#[test]
fn test_missing_image_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StateStore::new(dir.path());
    store.save(&sample_session()).unwrap();
    std::fs::remove_file(dir.path().join("images").join("content.png")).unwrap();

    assert!(matches!(store.load(), Err(PersistenceError::ReadError(_))));
}
