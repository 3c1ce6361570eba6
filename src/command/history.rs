use crate::raster::RasterSnapshot;

/// Linear undo/redo stack of full raster snapshots, one per completed stroke.
///
/// Invariant: `cursor` is `Some(i)` with `i < snapshots.len()` whenever the
/// stack is non-empty, and `None` when it is empty.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    snapshots: Vec<RasterSnapshot>,
    cursor: Option<usize>,
}

impl EditHistory {
    /// Creates a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the stack to `[initial]` with the cursor on it
    pub fn start(&mut self, initial: RasterSnapshot) {
        self.snapshots.clear();
        self.snapshots.push(initial);
        self.cursor = Some(0);
    }

    /// Appends `snapshot` after the cursor, discarding any undone snapshots
    pub fn commit(&mut self, snapshot: RasterSnapshot) {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(snapshot);
        self.cursor = Some(self.snapshots.len() - 1);
    }

    /// Steps back one snapshot. No-op at the initial snapshot.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                true
            }
            _ => false,
        }
    }

    /// Steps forward one snapshot. No-op at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.snapshots.len() => {
                self.cursor = Some(cursor + 1);
                true
            }
            _ => false,
        }
    }

    /// The snapshot under the cursor
    pub fn current(&self) -> Option<&RasterSnapshot> {
        self.cursor.and_then(|cursor| self.snapshots.get(cursor))
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor + 1 < self.snapshots.len())
    }

    /// Drops every snapshot
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    /// Position of the cursor, `None` while empty
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[RasterSnapshot] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn snapshot() -> RasterSnapshot {
        RasterSnapshot::from_image(RgbaImage::new(1, 1))
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = EditHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert!(history.current().is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_start_resets_to_single_snapshot() {
        let mut history = EditHistory::new();
        history.start(snapshot());
        history.commit(snapshot());

        let initial = snapshot();
        history.start(initial.clone());
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.current(), Some(&initial));
    }

    #[test]
    fn test_commit_on_empty_history_starts_it() {
        let mut history = EditHistory::new();
        history.commit(snapshot());
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_clear_empties_history() {
        let mut history = EditHistory::new();
        history.start(snapshot());
        history.commit(snapshot());
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert!(!history.undo());
        assert!(!history.redo());
    }
}
