use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::generation::GenerationHistory;

/// File name of the `n`th exported result, counting from 1
pub fn export_file_name(n: usize) -> String {
    format!("styled-image-{}.png", n)
}

/// Writes every ready result into `dir` as numbered PNGs.
///
/// Pending slots are skipped and do not consume a number.
pub fn export_all(dir: &Path, history: &GenerationHistory) -> Result<Vec<PathBuf>, ExportError> {
    let images: Vec<_> = history.ready_images().collect();
    if images.is_empty() {
        log::warn!("Export requested with no generated images");
        return Err(ExportError::NothingToExport);
    }

    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let path = dir.join(export_file_name(i + 1));
        fs::write(&path, image.after.encode_png()?)?;
        written.push(path);
    }

    log::info!("Exported {} images to {}", written.len(), dir.display());
    Ok(written)
}
