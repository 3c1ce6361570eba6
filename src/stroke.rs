use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};

use crate::raster::RasterBuffer;

/// How a stroke combines with what is already in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeMode {
    /// Source-over: the stroke colour is layered on top
    #[default]
    Paint,
    /// Destination-out: coverage is subtracted from the existing alpha
    Erase,
}

/// Width (in buffer pixels) and colour of the stroke being rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushStyle {
    pub width: f32,
    pub color: Color32,
}

impl BrushStyle {
    pub fn new(width: f32, color: Color32) -> Self {
        Self { width, color }
    }
}

/// Renders a round-capped segment between two buffer-space points.
///
/// Coverage is the distance from each pixel centre to the segment, so the
/// ends and every joint between consecutive segments come out round.
/// Points outside the buffer are fine; drawing is clipped to its bounds.
pub fn render_segment(
    buffer: &mut RasterBuffer,
    from: Pos2,
    to: Pos2,
    style: BrushStyle,
    mode: StrokeMode,
) {
    let radius = style.width.max(0.0) / 2.0;
    let (width, height) = (buffer.width() as i64, buffer.height() as i64);
    if width == 0 || height == 0 {
        return;
    }

    let min_x = ((from.x.min(to.x) - radius - 1.0).floor() as i64).max(0);
    let min_y = ((from.y.min(to.y) - radius - 1.0).floor() as i64).max(0);
    let max_x = ((from.x.max(to.x) + radius + 1.0).ceil() as i64).min(width - 1);
    let max_y = ((from.y.max(to.y) + radius + 1.0).ceil() as i64).min(height - 1);
    if min_x > max_x || min_y > max_y {
        return;
    }

    let [sr, sg, sb, sa] = style.color.to_srgba_unmultiplied();
    let image = buffer.image_mut();

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
            let coverage = (radius + 0.5 - distance_to_segment(center, from, to)).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }

            let pixel = image.get_pixel_mut(x as u32, y as u32);
            pixel.0 = match mode {
                StrokeMode::Paint => {
                    source_over(pixel.0, [sr, sg, sb], sa as f32 / 255.0 * coverage)
                }
                StrokeMode::Erase => destination_out(pixel.0, coverage),
            };
        }
    }
}

fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

fn source_over(dst: [u8; 4], src: [u8; 3], src_alpha: f32) -> [u8; 4] {
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        return [0, 0, 0, 0];
    }
    let channel = |s: u8, d: u8| {
        let value = (s as f32 * src_alpha + d as f32 * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

fn destination_out(dst: [u8; 4], coverage: f32) -> [u8; 4] {
    let alpha = (dst[3] as f32 * (1.0 - coverage)).round().clamp(0.0, 255.0) as u8;
    if alpha == 0 {
        [0, 0, 0, 0]
    } else {
        [dst[0], dst[1], dst[2], alpha]
    }
}

/// The open path of a stroke between pointer-down and pointer-up
#[derive(Debug, Clone)]
pub struct StrokeInProgress {
    mode: StrokeMode,
    style: BrushStyle,
    last_point: Pos2,
    segments: usize,
}

impl StrokeInProgress {
    /// Opens the path at `start`; nothing is drawn until a second point arrives
    pub fn begin(start: Pos2, style: BrushStyle, mode: StrokeMode) -> Self {
        Self {
            mode,
            style,
            last_point: start,
            segments: 0,
        }
    }

    /// Draws from the previous point to `point`
    pub fn extend(&mut self, buffer: &mut RasterBuffer, point: Pos2) {
        render_segment(buffer, self.last_point, point, self.style, self.mode);
        self.last_point = point;
        self.segments += 1;
    }

    pub fn mode(&self) -> StrokeMode {
        self.mode
    }

    pub fn last_point(&self) -> Pos2 {
        self.last_point
    }

    /// Number of segments rendered so far; zero for a tap without movement
    pub fn segments(&self) -> usize {
        self.segments
    }
}
