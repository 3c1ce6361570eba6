use egui::{Pos2, Rect, Vec2};

/// Maps pointer positions on the displayed surface into raster-buffer pixels.
///
/// The displayed size of the surface changes with layout, so the scale is
/// derived from the current surface rect on every call instead of being
/// cached at session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    surface: Rect,
    buffer_size: [u32; 2],
}

impl CoordinateMapper {
    pub fn new(surface: Rect, buffer_size: [u32; 2]) -> Self {
        Self {
            surface,
            buffer_size,
        }
    }

    /// Update the on-screen rect (e.g. after a window resize or reflow)
    pub fn set_surface(&mut self, surface: Rect) {
        self.surface = surface;
    }

    pub fn surface(&self) -> Rect {
        self.surface
    }

    /// Buffer pixels per displayed point, per axis.
    /// A collapsed surface maps 1:1.
    pub fn scale(&self) -> Vec2 {
        let displayed = self.surface.size();
        let axis = |buffer: u32, shown: f32| {
            if shown > 0.0 {
                buffer as f32 / shown
            } else {
                1.0
            }
        };
        Vec2::new(
            axis(self.buffer_size[0], displayed.x),
            axis(self.buffer_size[1], displayed.y),
        )
    }

    /// Pointer position to sub-pixel buffer coordinate. Not clamped.
    pub fn to_buffer(&self, pointer: Pos2) -> Pos2 {
        let offset = pointer - self.surface.min;
        let scale = self.scale();
        Pos2::new(offset.x * scale.x, offset.y * scale.y)
    }

    /// On-screen radius of a brush whose width is given in buffer pixels
    pub fn brush_preview_radius(&self, brush_size: f32) -> f32 {
        brush_size / self.scale().x / 2.0
    }
}

/// Largest rect with the given aspect that fits centred inside `available`
pub fn fit_centered(available: Rect, content_size: Vec2) -> Rect {
    if content_size.x <= 0.0 || content_size.y <= 0.0 {
        return Rect::from_center_size(available.center(), Vec2::ZERO);
    }
    let scale = (available.width() / content_size.x).min(available.height() / content_size.y);
    Rect::from_center_size(available.center(), content_size * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_maps_half_size_display() {
        let surface = Rect::from_min_size(pos2(40.0, 60.0), Vec2::new(500.0, 250.0));
        let mapper = CoordinateMapper::new(surface, [1000, 500]);

        let mapped = mapper.to_buffer(pos2(140.0, 160.0));
        assert_eq!(mapped, pos2(200.0, 200.0));
    }

    #[test]
    fn test_scale_follows_surface_resize() {
        let mut mapper =
            CoordinateMapper::new(Rect::from_min_size(Pos2::ZERO, Vec2::splat(100.0)), [400, 400]);
        assert_eq!(mapper.to_buffer(pos2(10.0, 10.0)), pos2(40.0, 40.0));

        mapper.set_surface(Rect::from_min_size(Pos2::ZERO, Vec2::splat(200.0)));
        assert_eq!(mapper.to_buffer(pos2(10.0, 10.0)), pos2(20.0, 20.0));
    }

    #[test]
    fn test_out_of_bounds_passes_through() {
        let mapper =
            CoordinateMapper::new(Rect::from_min_size(Pos2::ZERO, Vec2::splat(100.0)), [100, 100]);
        assert_eq!(mapper.to_buffer(pos2(-5.0, 150.0)), pos2(-5.0, 150.0));
    }

    #[test]
    fn test_collapsed_surface_maps_one_to_one() {
        let collapsed = Rect::from_min_size(pos2(10.0, 10.0), Vec2::ZERO);
        let mapper = CoordinateMapper::new(collapsed, [64, 64]);
        assert_eq!(mapper.scale(), Vec2::splat(1.0));
        assert_eq!(mapper.to_buffer(pos2(12.0, 13.0)), pos2(2.0, 3.0));
    }

    #[test]
    fn test_fit_centered_keeps_aspect() {
        let available = Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 200.0));
        let rect = fit_centered(available, Vec2::new(100.0, 100.0));
        assert_eq!(rect.size(), Vec2::new(200.0, 200.0));
        assert_eq!(rect.center(), pos2(200.0, 100.0));
    }
}
