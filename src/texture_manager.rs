use egui::{Context, TextureHandle, TextureId, TextureOptions};
use std::collections::HashMap;

use crate::raster::{RasterBuffer, RasterSnapshot};

/// Where a texture's pixels come from: a frozen snapshot or a revision of the live canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Snapshot(u64),
    Canvas(u64),
}

/// Uploads images to the GPU once and keeps the most recently used ones around
pub struct TextureManager {
    texture_cache: HashMap<TextureKey, TextureHandle>,
    /// Frame each texture was last used
    last_used: HashMap<TextureKey, u64>,
    current_frame: u64,
    max_cache_size: usize,
}

impl TextureManager {
    /// Creates a new texture manager with the specified cache size
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Texture for an immutable snapshot. Snapshot ids are unique, so a hit is always current.
    pub fn snapshot_texture(&mut self, ctx: &Context, snapshot: &RasterSnapshot) -> TextureId {
        let key = TextureKey::Snapshot(snapshot.id());
        self.get_or_create(ctx, key, || snapshot.to_color_image())
    }

    /// Texture for the live edit canvas at `revision`. Older revisions are dropped.
    pub fn canvas_texture(
        &mut self,
        ctx: &Context,
        buffer: &RasterBuffer,
        revision: u64,
    ) -> TextureId {
        let key = TextureKey::Canvas(revision);
        if !self.texture_cache.contains_key(&key) {
            self.invalidate_canvas();
        }
        self.get_or_create(ctx, key, || {
            egui::ColorImage::from_rgba_unmultiplied(
                [buffer.width() as usize, buffer.height() as usize],
                buffer.image().as_raw(),
            )
        })
    }

    fn get_or_create(
        &mut self,
        ctx: &Context,
        key: TextureKey,
        image: impl FnOnce() -> egui::ColorImage,
    ) -> TextureId {
        if let Some(handle) = self.texture_cache.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return handle.id();
        }

        self.prune_cache_if_needed();

        let name = match key {
            TextureKey::Snapshot(id) => format!("snapshot_{}", id),
            TextureKey::Canvas(revision) => format!("canvas_r{}", revision),
        };
        let handle = ctx.load_texture(name, image(), TextureOptions::LINEAR);
        let id = handle.id();
        self.texture_cache.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        id
    }

    /// Drops every canvas texture, e.g. when an edit session ends
    pub fn invalidate_canvas(&mut self) {
        self.texture_cache.retain(|key, _| !matches!(key, TextureKey::Canvas(_)));
        self.last_used.retain(|key, _| !matches!(key, TextureKey::Canvas(_)));
    }

    /// Evicts least recently used textures until there is room for one more
    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() < self.max_cache_size {
            return;
        }

        let mut entries: Vec<(TextureKey, u64)> =
            self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = self.texture_cache.len() + 1 - self.max_cache_size;
        for (key, _) in entries.iter().take(to_remove) {
            self.texture_cache.remove(key);
            self.last_used.remove(key);
        }
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    #[cfg(test)]
    fn contains(&self, key: TextureKey) -> bool {
        self.texture_cache.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn snapshot() -> RasterSnapshot {
        RasterSnapshot::from_image(RgbaImage::new(4, 4))
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let image = snapshot();

        let first = manager.snapshot_texture(&ctx, &image);
        let second = manager.snapshot_texture(&ctx, &image.clone());
        assert_eq!(first, second);
        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        let (a, b, c) = (snapshot(), snapshot(), snapshot());

        manager.snapshot_texture(&ctx, &a);
        manager.begin_frame();
        manager.snapshot_texture(&ctx, &b);
        manager.begin_frame();
        manager.snapshot_texture(&ctx, &c);

        assert_eq!(manager.cache_size(), 2);
        assert!(!manager.contains(TextureKey::Snapshot(a.id())));
        assert!(manager.contains(TextureKey::Snapshot(b.id())));
        assert!(manager.contains(TextureKey::Snapshot(c.id())));
    }

    #[test]
    fn test_canvas_keeps_only_latest_revision() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let buffer = RasterBuffer::new(4, 4);

        manager.canvas_texture(&ctx, &buffer, 1);
        manager.canvas_texture(&ctx, &buffer, 2);
        assert!(!manager.contains(TextureKey::Canvas(1)));
        assert!(manager.contains(TextureKey::Canvas(2)));

        manager.invalidate_canvas();
        assert_eq!(manager.cache_size(), 0);
    }
}
