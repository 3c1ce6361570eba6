use serde::{Deserialize, Serialize};

/// A named, ready-made style description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt: &'static str,
}

pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        id: "anime",
        name: "Anime",
        prompt: "Redraw in a vibrant, modern anime/manga art style, with clean lines, sharp details, and expressive cel-shaded characters.",
    },
    StylePreset {
        id: "cyberpunk",
        name: "Cyberpunk",
        prompt: "Transform into a cyberpunk scene, with neon lighting, futuristic technology, high-contrast colors, and a gritty, dystopian atmosphere.",
    },
    StylePreset {
        id: "watercolor",
        name: "Watercolor",
        prompt: "Convert to a delicate watercolor painting, with soft washes of color, visible brushstrokes, and bleeding edges on textured paper.",
    },
    StylePreset {
        id: "pixel_art",
        name: "Pixel Art",
        prompt: "Recreate as detailed 16-bit pixel art, using a limited color palette, sharp pixel clusters, and a retro video game aesthetic.",
    },
    StylePreset {
        id: "vintage",
        name: "Vintage Photo",
        prompt: "Give it the look of a faded vintage photograph from the 1970s, with sepia tones, film grain, light leaks, and a soft focus.",
    },
    StylePreset {
        id: "cartoon",
        name: "Cartoon",
        prompt: "Redraw in a bold, American cartoon style, with thick outlines, simplified shapes, solid colors, and dynamic, playful energy.",
    },
    StylePreset {
        id: "fantasy_art",
        name: "Fantasy Art",
        prompt: "Transform into an epic fantasy art illustration, with dramatic lighting, intricate details, mythical elements, and a painterly, digital art style reminiscent of high-fantasy book covers.",
    },
    StylePreset {
        id: "comic_book",
        name: "Comic Book",
        prompt: "Convert into a classic comic book panel, featuring bold ink outlines, vibrant flat colors, halftone dot patterns for shading, and a dynamic, action-oriented feel.",
    },
    StylePreset {
        id: "three_d_render",
        name: "3D Render",
        prompt: "Reimagine the image as a high-quality 3D render, with smooth surfaces, realistic lighting and shadows, and a polished, Pixar-like aesthetic.",
    },
    StylePreset {
        id: "steampunk",
        name: "Steampunk",
        prompt: "Reimagine in a steampunk style, featuring intricate clockwork, steam-powered machinery, Victorian-era aesthetics, and a color palette of brass, copper, and mahogany.",
    },
    StylePreset {
        id: "passport_photo",
        name: "Passport Photo",
        prompt: "Recreate the image as a regulation-compliant passport photograph. The subject must have a neutral expression, facing directly forward. The background must be a solid, uniform off-white or light grey color. Lighting should be even with no shadows. The final image should be a tight, cropped headshot from the shoulders up. Remove any accessories like hats or sunglasses.",
    },
    StylePreset {
        id: "linkedin_profile",
        name: "LinkedIn Profile",
        prompt: "Generate a professional, high-quality square profile picture suitable for LinkedIn. The subject should be the main focus, cropped from the chest up, with a warm and approachable expression. The background should be simple and unobtrusive, such as a blurred office setting or a solid neutral color. The lighting must be bright and even, highlighting the subject's face clearly. The overall tone should be professional and engaging.",
    },
];

/// Looks up a preset by its stable id
pub fn style_preset(id: &str) -> Option<&'static StylePreset> {
    STYLE_PRESETS.iter().find(|preset| preset.id == id)
}

/// Target aspect ratio of a generated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Square,
    Portrait,
    Landscape,
    TallPortrait,
    WideLandscape,
}

impl Resolution {
    pub const ALL: [Resolution; 5] = [
        Resolution::Square,
        Resolution::Portrait,
        Resolution::Landscape,
        Resolution::TallPortrait,
        Resolution::WideLandscape,
    ];

    /// Ratio as sent to the generation service
    pub fn value(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
            Self::TallPortrait => "9:16",
            Self::WideLandscape => "16:9",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Portrait => "Portrait",
            Self::Landscape => "Landscape",
            Self::TallPortrait => "Tall portrait",
            Self::WideLandscape => "Wide landscape",
        }
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        match self {
            Self::Square => 1.0,
            Self::Portrait => 3.0 / 4.0,
            Self::Landscape => 4.0 / 3.0,
            Self::TallPortrait => 9.0 / 16.0,
            Self::WideLandscape => 16.0 / 9.0,
        }
    }
}
