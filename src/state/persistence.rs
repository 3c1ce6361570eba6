use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::error::RasterError;
use crate::generation::{GeneratedImage, GenerationHistory, Resolution};
use crate::raster::RasterSnapshot;
use crate::tools::ToolSettings;
use crate::util::time;

const MANIFEST_FILE: &str = "session.json";
const IMAGES_DIR: &str = "images";

/// Errors that can occur during state persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize state: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to write state: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to read state file: {0}")]
    ReadError(String),

    #[error("Invalid state data: {0}")]
    InvalidState(String),

    #[error("Failed to store image: {0}")]
    ImageError(#[from] RasterError),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// What survives a restart. Edit sessions never do.
#[derive(Debug, Clone, Default)]
pub struct SavedSession {
    pub content_image: Option<RasterSnapshot>,
    pub style_image: Option<RasterSnapshot>,
    pub generated: GenerationHistory,
    pub prompt: String,
    pub negative_prompt: String,
    pub selected_style: Option<String>,
    pub resolution: Resolution,
    pub tools: ToolSettings,
}

/// On-disk form of a generated image: PNG file names relative to the images dir
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredImage {
    id: Uuid,
    after: String,
    before: Option<String>,
}

/// The JSON document written next to the images
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionManifest {
    version: String,
    timestamp: u64,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    negative_prompt: String,
    #[serde(default)]
    selected_style: Option<String>,
    #[serde(default)]
    resolution: Resolution,
    #[serde(default)]
    tools: ToolSettings,
    #[serde(default)]
    current_index: usize,
    #[serde(default)]
    content_image: Option<String>,
    #[serde(default)]
    style_image: Option<String>,
    #[serde(default)]
    generated: Vec<StoredImage>,
}

/// Paths that exist once the store has been opened
#[derive(Debug, Clone)]
struct StoreHandle {
    manifest: PathBuf,
    images: PathBuf,
}

/// Explicitly passed session store.
///
/// Nothing touches the disk until the first save or load; `close` releases
/// the handle at teardown and the next use opens it again.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
    handle: Option<StoreHandle>,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handle: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the handle
    pub fn close(&mut self) {
        if self.handle.take().is_some() {
            log::info!("Closed state store at {}", self.root.display());
        }
    }

    fn open(&mut self) -> PersistenceResult<StoreHandle> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }

        let images = self.root.join(IMAGES_DIR);
        fs::create_dir_all(&images)?;
        let handle = StoreHandle {
            manifest: self.root.join(MANIFEST_FILE),
            images,
        };
        log::info!("Opened state store at {}", self.root.display());
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    /// Writes `session`, replacing whatever was saved before
    pub fn save(&mut self, session: &SavedSession) -> PersistenceResult<()> {
        let handle = self.open()?;

        let content_image = session
            .content_image
            .as_ref()
            .map(|image| write_png(&handle.images, "content.png", image))
            .transpose()?;
        let style_image = session
            .style_image
            .as_ref()
            .map(|image| write_png(&handle.images, "style.png", image))
            .transpose()?;

        let mut generated = Vec::new();
        for image in session.generated.ready_images() {
            generated.push(store_generated(&handle.images, image)?);
        }

        // Pending slots are skipped, so the viewed index is recomputed against ready images only
        let current_index = session
            .generated
            .slots()
            .iter()
            .take(session.generated.current_index() + 1)
            .filter(|slot| !slot.is_pending())
            .count()
            .saturating_sub(1);

        let manifest = SessionManifest {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: time::timestamp_secs(),
            prompt: session.prompt.clone(),
            negative_prompt: session.negative_prompt.clone(),
            selected_style: session.selected_style.clone(),
            resolution: session.resolution,
            tools: session.tools,
            current_index,
            content_image,
            style_image,
            generated,
        };

        let json = serde_json::to_string_pretty(&manifest)?;
        let tmp = handle.manifest.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &handle.manifest)?;

        cleanup_unreferenced(&handle.images, &manifest)?;
        log::info!(
            "Saved session with {} generated images to {}",
            manifest.generated.len(),
            self.root.display()
        );
        Ok(())
    }

    /// Loads the last saved session, `None` if nothing was ever saved
    pub fn load(&mut self) -> PersistenceResult<Option<SavedSession>> {
        let handle = self.open()?;
        if !handle.manifest.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&handle.manifest)
            .map_err(|e| PersistenceError::ReadError(e.to_string()))?;
        let manifest: SessionManifest = serde_json::from_str(&json)?;

        if manifest.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Session saved by version {} differs from current version {}",
                manifest.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        let content_image = manifest
            .content_image
            .as_deref()
            .map(|name| read_png(&handle.images, name))
            .transpose()?;
        let style_image = manifest
            .style_image
            .as_deref()
            .map(|name| read_png(&handle.images, name))
            .transpose()?;

        let mut images = Vec::with_capacity(manifest.generated.len());
        for stored in &manifest.generated {
            let after = read_png(&handle.images, &stored.after)?;
            let before = stored
                .before
                .as_deref()
                .map(|name| read_png(&handle.images, name))
                .transpose()?;
            images.push(GeneratedImage {
                id: stored.id,
                after,
                before,
            });
        }

        Ok(Some(SavedSession {
            content_image,
            style_image,
            generated: GenerationHistory::restore(images, manifest.current_index),
            prompt: manifest.prompt,
            negative_prompt: manifest.negative_prompt,
            selected_style: manifest.selected_style,
            resolution: manifest.resolution,
            tools: manifest.tools,
        }))
    }
}

fn write_png(dir: &Path, name: &str, image: &RasterSnapshot) -> PersistenceResult<String> {
    fs::write(dir.join(name), image.encode_png()?)?;
    Ok(name.to_owned())
}

/// Generated images never change, so a file already on disk is reused
fn store_generated(dir: &Path, image: &GeneratedImage) -> PersistenceResult<StoredImage> {
    let after = format!("{}-after.png", image.id);
    if !dir.join(&after).exists() {
        write_png(dir, &after, &image.after)?;
    }

    let before = match &image.before {
        Some(before) => {
            let name = format!("{}-before.png", image.id);
            if !dir.join(&name).exists() {
                write_png(dir, &name, before)?;
            }
            Some(name)
        }
        None => None,
    };

    Ok(StoredImage {
        id: image.id,
        after,
        before,
    })
}

fn read_png(dir: &Path, name: &str) -> PersistenceResult<RasterSnapshot> {
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(PersistenceError::InvalidState(format!("bad image file name: {}", name)));
    }
    let bytes = fs::read(dir.join(name))
        .map_err(|e| PersistenceError::ReadError(format!("{}: {}", name, e)))?;
    Ok(RasterSnapshot::decode(&bytes)?)
}

/// Removes image files the manifest no longer points at
fn cleanup_unreferenced(dir: &Path, manifest: &SessionManifest) -> PersistenceResult<()> {
    let referenced: Vec<&str> = manifest
        .content_image
        .iter()
        .chain(manifest.style_image.iter())
        .map(String::as_str)
        .chain(manifest.generated.iter().flat_map(|stored| {
            std::iter::once(stored.after.as_str()).chain(stored.before.as_deref())
        }))
        .collect();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".png") && !referenced.contains(&name.as_ref()) {
            log::debug!("Removing unreferenced image {}", name);
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Debounces saves: due a fixed delay after the last change
#[derive(Debug, Clone)]
pub struct AutosaveTimer {
    delay_secs: f64,
    changed_at: Option<f64>,
}

impl AutosaveTimer {
    pub fn new(delay_secs: f64) -> Self {
        Self {
            delay_secs,
            changed_at: None,
        }
    }

    /// Records a change at `now`, pushing the deadline back
    pub fn mark_changed(&mut self, now: f64) {
        self.changed_at = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.changed_at.is_some()
    }

    /// True once the delay has passed since the last change
    pub fn is_due(&self, now: f64) -> bool {
        self.changed_at.is_some_and(|changed| now - changed >= self.delay_secs)
    }

    /// Seconds until the save is due, for scheduling a repaint
    pub fn remaining(&self, now: f64) -> Option<f64> {
        self.changed_at.map(|changed| (self.delay_secs - (now - changed)).max(0.0))
    }

    pub fn reset(&mut self) {
        self.changed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autosave_debounce() {
        let mut timer = AutosaveTimer::new(1.5);
        assert!(!timer.is_due(100.0));

        timer.mark_changed(10.0);
        assert!(!timer.is_due(11.0));
        timer.mark_changed(11.0);
        assert!(!timer.is_due(12.0));
        assert!(timer.is_due(12.5));
        assert_eq!(timer.remaining(12.0), Some(0.5));

        timer.reset();
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_store_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = StateStore::new(dir.path().join("state"));
        assert!(!store.is_open());
        assert!(!dir.path().join("state").exists());

        assert!(store.load().unwrap().is_none());
        assert!(store.is_open());
        assert!(dir.path().join("state").join(IMAGES_DIR).is_dir());

        store.close();
        assert!(!store.is_open());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_png(dir.path(), "../secret.png"),
            Err(PersistenceError::InvalidState(_))
        ));
    }
}
