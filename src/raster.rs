use std::io::Cursor;
use std::sync::Arc;

use egui::{Color32, ColorImage, Vec2};
use image::{ImageFormat, Rgba, RgbaImage, imageops};

use crate::error::RasterError;
use crate::id_generator;

/// Long side, in pixels, of images handed to the generation service
pub const MAX_DIMENSION: u32 = 1024;

/// Mutable pixel grid with straight (non-premultiplied) alpha.
///
/// Owned exclusively by the active edit session; everything else only ever
/// sees frozen [`RasterSnapshot`]s.
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    pixels: RgbaImage,
}

impl RasterBuffer {
    /// Creates a fully transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Buffer dimensions as `[width, height]`
    pub fn size(&self) -> [u32; 2] {
        [self.pixels.width(), self.pixels.height()]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if x < self.width() && y < self.height() {
            let Rgba([r, g, b, a]) = *self.pixels.get_pixel(x, y);
            Some(Color32::from_rgba_unmultiplied(r, g, b, a))
        } else {
            None
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Freezes the current pixels into a new snapshot
    pub fn snapshot(&self) -> RasterSnapshot {
        RasterSnapshot::from_image(self.pixels.clone())
    }

    /// Replaces the whole buffer with the content of `snapshot`
    pub fn load(&mut self, snapshot: &RasterSnapshot) {
        self.pixels = snapshot.image().clone();
    }
}

/// Frozen copy of a raster buffer at one point in time.
///
/// Cloning is cheap: the pixels are shared and never mutated after creation.
#[derive(Clone)]
pub struct RasterSnapshot {
    id: u64,
    pixels: Arc<RgbaImage>,
}

impl RasterSnapshot {
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self {
            id: id_generator::generate_id(),
            pixels: Arc::new(pixels),
        }
    }

    /// Decodes any supported image format into a snapshot
    pub fn decode(bytes: &[u8]) -> Result<Self, RasterError> {
        let decoded = image::load_from_memory(bytes).map_err(RasterError::Decode)?;
        let pixels = decoded.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(RasterError::Empty {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(Self::from_image(pixels))
    }

    /// Serializes the snapshot as PNG
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(RasterError::Encode)?;
        Ok(bytes)
    }

    /// Process-unique identifier, stable for the lifetime of the snapshot
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> [u32; 2] {
        [self.pixels.width(), self.pixels.height()]
    }

    pub fn size_vec2(&self) -> Vec2 {
        Vec2::new(self.pixels.width() as f32, self.pixels.height() as f32)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if x < self.width() && y < self.height() {
            let Rgba([r, g, b, a]) = *self.pixels.get_pixel(x, y);
            Some(Color32::from_rgba_unmultiplied(r, g, b, a))
        } else {
            None
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Thaws the snapshot into a fresh mutable buffer
    pub fn to_buffer(&self) -> RasterBuffer {
        RasterBuffer::from_image(self.pixels.as_ref().clone())
    }

    /// Converts to an egui image for texture upload
    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied(
            [self.pixels.width() as usize, self.pixels.height() as usize],
            self.pixels.as_raw(),
        )
    }
}

impl std::fmt::Debug for RasterSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSnapshot")
            .field("id", &self.id)
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .finish()
    }
}

impl PartialEq for RasterSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Centre-crops `source` to `aspect` (width / height) and rescales it so the
/// long side is `max_dimension` pixels.
pub fn resize_and_pad(source: &RasterSnapshot, aspect: f32, max_dimension: u32) -> RasterSnapshot {
    let (width, height) = (source.width() as f32, source.height() as f32);
    let source_aspect = width / height;

    let (crop_x, crop_y, crop_w, crop_h) = if source_aspect > aspect {
        // Wider than the target: trim the sides
        let crop_w = height * aspect;
        ((width - crop_w) / 2.0, 0.0, crop_w, height)
    } else {
        // Taller than the target: trim top and bottom
        let crop_h = width / aspect;
        (0.0, (height - crop_h) / 2.0, width, crop_h)
    };

    let crop_w = (crop_w.round() as u32).clamp(1, source.width());
    let crop_h = (crop_h.round() as u32).clamp(1, source.height());
    let crop_x = (crop_x.round() as u32).min(source.width() - crop_w);
    let crop_y = (crop_y.round() as u32).min(source.height() - crop_h);

    let max = max_dimension as f32;
    let (out_w, out_h) = if aspect >= 1.0 {
        (max, max / aspect)
    } else {
        (max * aspect, max)
    };
    let out_w = (out_w.round() as u32).max(1);
    let out_h = (out_h.round() as u32).max(1);

    let cropped = imageops::crop_imm(source.image(), crop_x, crop_y, crop_w, crop_h).to_image();
    let resized = imageops::resize(&cropped, out_w, out_h, imageops::FilterType::Triangle);
    RasterSnapshot::from_image(resized)
}
