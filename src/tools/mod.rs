use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::stroke::{BrushStyle, StrokeMode};

/// Smallest brush the size slider allows, in buffer pixels
pub const MIN_BRUSH_SIZE: f32 = 1.0;
/// Largest brush the size slider allows, in buffer pixels
pub const MAX_BRUSH_SIZE: f32 = 100.0;
pub const DEFAULT_BRUSH_SIZE: f32 = 20.0;

/// The freehand tools available while editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Brush,
    Eraser,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::Brush, ToolKind::Eraser];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Brush => "Brush",
            Self::Eraser => "Eraser",
        }
    }

    pub fn stroke_mode(&self) -> StrokeMode {
        match self {
            Self::Brush => StrokeMode::Paint,
            Self::Eraser => StrokeMode::Erase,
        }
    }
}

/// Tool choice, size and colour.
///
/// Survives across edit sessions and app restarts; entering a new session
/// never resets it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub tool: ToolKind,
    brush_size: f32,
    pub brush_color: Color32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::Brush,
            brush_size: DEFAULT_BRUSH_SIZE,
            brush_color: Color32::BLACK,
        }
    }
}

impl ToolSettings {
    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Sets the brush size, clamped to the slider range
    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = if size.is_finite() {
            size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
        } else {
            DEFAULT_BRUSH_SIZE
        };
    }

    /// Style for a new stroke with the current settings
    pub fn brush_style(&self) -> BrushStyle {
        BrushStyle::new(self.brush_size, self.brush_color)
    }

    pub fn stroke_mode(&self) -> StrokeMode {
        self.tool.stroke_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ToolSettings::default();
        assert_eq!(settings.tool, ToolKind::Brush);
        assert_eq!(settings.brush_size(), 20.0);
        assert_eq!(settings.brush_color, Color32::BLACK);
    }

    #[test]
    fn test_brush_size_is_clamped() {
        let mut settings = ToolSettings::default();
        settings.set_brush_size(0.0);
        assert_eq!(settings.brush_size(), MIN_BRUSH_SIZE);
        settings.set_brush_size(500.0);
        assert_eq!(settings.brush_size(), MAX_BRUSH_SIZE);
        settings.set_brush_size(f32::NAN);
        assert_eq!(settings.brush_size(), DEFAULT_BRUSH_SIZE);
    }

    #[test]
    fn test_tool_maps_to_stroke_mode() {
        assert_eq!(ToolKind::Brush.stroke_mode(), StrokeMode::Paint);
        assert_eq!(ToolKind::Eraser.stroke_mode(), StrokeMode::Erase);
    }
}
