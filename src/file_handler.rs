use eframe::egui;
use std::path::Path;

use crate::error::LoadError;
use crate::raster::RasterSnapshot;

/// Which input slot an image goes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageTarget {
    #[default]
    Content,
    Style,
}

impl ImageTarget {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Style => "style",
        }
    }
}

/// A decoded image on its way to a slot
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub target: ImageTarget,
    pub name: String,
    pub image: RasterSnapshot,
}

/// Collects dropped files and routes them to the slot under the pointer
#[derive(Debug, Default)]
pub struct FileHandler {
    content_rect: Option<egui::Rect>,
    style_rect: Option<egui::Rect>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers where the drop zones were laid out this frame
    pub fn set_drop_zones(&mut self, content: egui::Rect, style: egui::Rect) {
        self.content_rect = Some(content);
        self.style_rect = Some(style);
    }

    /// The slot a drop at `pointer` lands in. Anything outside the style zone goes to content.
    pub fn target_at(&self, pointer: Option<egui::Pos2>) -> ImageTarget {
        match (pointer, self.style_rect) {
            (Some(pos), Some(style)) if style.contains(pos) => ImageTarget::Style,
            _ => ImageTarget::Content,
        }
    }

    /// Decodes any files dropped this frame.
    /// Unsupported or unreadable files are logged and skipped.
    pub fn take_dropped_images(&self, ctx: &egui::Context) -> Vec<LoadedImage> {
        let (dropped, pointer) =
            ctx.input(|i| (i.raw.dropped_files.clone(), i.pointer.latest_pos()));
        if dropped.is_empty() {
            return Vec::new();
        }

        let target = self.target_at(pointer);
        let mut loaded = Vec::new();
        for file in &dropped {
            let name = file_name(file);
            if !is_image_file(file) {
                log::warn!("Dropped file is not a supported type: {}", name);
                continue;
            }

            match read_dropped(file) {
                Ok(image) => {
                    log::info!(
                        "Loaded {} image {} ({}x{})",
                        target.label(),
                        name,
                        image.width(),
                        image.height()
                    );
                    loaded.push(LoadedImage {
                        target,
                        name,
                        image,
                    });
                }
                Err(err) => log::error!("Failed to load dropped image {}: {}", name, err),
            }
        }

        if !loaded.is_empty() {
            ctx.request_repaint();
        }
        loaded
    }

    /// Preview files being dragged over the application
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, FontId, Id, LayerId, Order};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }

        let target = self.target_at(ctx.input(|i| i.pointer.latest_pos()));
        let layer = LayerId::new(Order::Foreground, Id::new("file_drop_target"));
        let painter = ctx.layer_painter(layer);
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(160));

        let zone = match target {
            ImageTarget::Content => self.content_rect,
            ImageTarget::Style => self.style_rect,
        };
        if let Some(zone) = zone {
            painter.rect_stroke(zone, 4.0, egui::Stroke::new(2.0, Color32::LIGHT_BLUE));
        }
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            format!("Drop to set the {} image", target.label()),
            FontId::proportional(24.0),
            Color32::WHITE,
        );
    }
}

/// Reads and decodes an image file from disk
pub fn load_image_file(path: &Path) -> Result<RasterSnapshot, LoadError> {
    let bytes = std::fs::read(path)?;
    Ok(RasterSnapshot::decode(&bytes)?)
}

fn read_dropped(file: &egui::DroppedFile) -> Result<RasterSnapshot, LoadError> {
    if let Some(bytes) = &file.bytes {
        return Ok(RasterSnapshot::decode(bytes)?);
    }
    match &file.path {
        Some(path) => load_image_file(path),
        None => Err(LoadError::NoData),
    }
}

fn file_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

/// Check if a file is an image based on MIME type or extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    let name = match &file.path {
        Some(path) => path.to_string_lossy().into_owned(),
        None => file.name.clone(),
    };
    has_image_extension(&name)
}

pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert!(has_image_extension("photo.JPG"));
        assert!(has_image_extension("/tmp/a.webp"));
        assert!(!has_image_extension("notes.txt"));
        assert!(!has_image_extension("png"));
    }

    #[test]
    fn test_mime_wins_over_extension() {
        let file = egui::DroppedFile {
            name: "picture.txt".to_owned(),
            mime: "image/png".to_owned(),
            ..Default::default()
        };
        assert!(is_image_file(&file));
    }

    #[test]
    fn test_drop_routing() {
        let mut handler = FileHandler::new();
        assert_eq!(handler.target_at(Some(egui::pos2(5.0, 5.0))), ImageTarget::Content);

        handler.set_drop_zones(
            egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 100.0)),
            egui::Rect::from_min_size(egui::pos2(0.0, 120.0), egui::vec2(100.0, 100.0)),
        );
        assert_eq!(handler.target_at(Some(egui::pos2(50.0, 150.0))), ImageTarget::Style);
        assert_eq!(handler.target_at(Some(egui::pos2(50.0, 50.0))), ImageTarget::Content);
        assert_eq!(handler.target_at(None), ImageTarget::Content);
    }

    #[test]
    fn test_undecodable_bytes_fail() {
        let file = egui::DroppedFile {
            name: "broken.png".to_owned(),
            bytes: Some(std::sync::Arc::from(&b"nope"[..])),
            ..Default::default()
        };
        assert!(matches!(read_dropped(&file), Err(LoadError::Raster(_))));
    }
}
