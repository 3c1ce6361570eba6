use eframe_stylize::command::EditHistory;
use eframe_stylize::raster::RasterSnapshot;
use image::{Rgba, RgbaImage};

// Each snapshot gets its own fill so equality checks are meaningful
fn snapshot(shade: u8) -> RasterSnapshot {
    RasterSnapshot::from_image(RgbaImage::from_pixel(4, 4, Rgba([shade, shade, shade, 255])))
}

fn history_of(count: u8) -> (EditHistory, Vec<RasterSnapshot>) {
    let snapshots: Vec<_> = (0..count).map(snapshot).collect();
    let mut history = EditHistory::new();
    history.start(snapshots[0].clone());
    for snap in &snapshots[1..] {
        history.commit(snap.clone());
    }
    (history, snapshots)
}

#[test]
fn test_commits_keep_cursor_at_the_end() {
    let mut history = EditHistory::new();
    history.start(snapshot(0));
    assert_eq!(history.cursor(), Some(0));
    assert!(!history.can_redo());

    for shade in 1..8 {
        history.commit(snapshot(shade));
        assert_eq!(history.cursor(), Some(history.len() - 1));
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }
}

#[test]
fn test_undo_then_redo_returns_to_newest() {
    let (mut history, snapshots) = history_of(4);

    assert!(history.undo());
    assert!(history.can_redo());
    assert_eq!(history.current(), Some(&snapshots[2]));

    assert!(history.redo());
    assert_eq!(history.cursor(), Some(3));
    assert_eq!(history.current(), Some(&snapshots[3]));
}

#[test]
fn test_commit_after_undo_truncates_future() {
    let (mut history, snapshots) = history_of(3);
    assert_eq!(history.cursor(), Some(2));

    history.undo();
    assert_eq!(history.cursor(), Some(1));

    let s3 = snapshot(3);
    history.commit(s3.clone());

    assert_eq!(history.snapshots(), &[snapshots[0].clone(), snapshots[1].clone(), s3][..]);
    assert_eq!(history.cursor(), Some(2));
    assert!(!history.can_redo());
}

#[test]
fn test_undo_at_initial_snapshot_is_noop() {
    let (mut history, snapshots) = history_of(1);

    assert!(!history.can_undo());
    assert!(!history.undo());
    assert_eq!(history.cursor(), Some(0));
    assert_eq!(history.len(), 1);
    assert_eq!(history.current(), Some(&snapshots[0]));
}

#[test]
fn test_redo_at_newest_snapshot_is_noop() {
    let (mut history, snapshots) = history_of(3);
    history.undo();
    history.redo();

    assert!(!history.redo());
    assert_eq!(history.cursor(), Some(2));
    assert_eq!(history.len(), 3);
    assert_eq!(history.current(), Some(&snapshots[2]));
}
