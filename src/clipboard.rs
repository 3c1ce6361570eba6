use std::borrow::Cow;

use crate::raster::RasterSnapshot;

/// The system clipboard, opened on first use and kept for the app's lifetime.
///
/// Some platforms drop copied data when the owning handle goes away, so the
/// handle is held rather than reopened per copy.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy_image(&mut self, image: &RasterSnapshot) -> Result<(), arboard::Error> {
        let clipboard = match self.handle.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let clipboard = self.handle.insert(clipboard);
        clipboard.set_image(image_data(image))?;
        log::info!("Copied {}x{} image to the clipboard", image.width(), image.height());
        Ok(())
    }
}

/// Unmultiplied RGBA rows, as the clipboard expects them
fn image_data(image: &RasterSnapshot) -> arboard::ImageData<'_> {
    arboard::ImageData {
        width: image.width() as usize,
        height: image.height() as usize,
        bytes: Cow::Borrowed(image.image().as_raw()),
    }
}
