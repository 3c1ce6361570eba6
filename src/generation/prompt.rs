use crate::generation::presets::{Resolution, StylePreset};
use crate::raster::RasterSnapshot;
use crate::state::{ConsumedEdit, EditSession};

const PRIMARY_GOAL: &str = "# Primary Goal\nRedraw the provided content image.";

const EDIT_GUIDANCE: &str = "The content image has been manually edited. IMPORTANT: Treat these edits (drawings or erasures) as a compositional guide for shape and placement, NOT as a style reference. Your task is to intelligently interpret these edits and seamlessly integrate them into the final image, ensuring the result strictly adheres to the primary artistic style (defined by the style image or prompt). For example, if a colorful line is drawn on a black-and-white photo, the resulting feature should be rendered in black-and-white. The text prompt is the ultimate authority; if it specifies colors or details, those instructions override the drawing. Fill any erased (transparent) areas in a way that is consistent with the scene and style.";

const STYLE_IMAGE_INSTRUCTION: &str = "Your main objective is to meticulously adopt the artistic style, color palette, and texture from the second input image (the style reference). Replicate its visual essence onto the content image.";

/// The user's current choices, as read when a generation is requested
#[derive(Debug, Clone, Copy)]
pub struct GenerationInputs<'a> {
    pub content: Option<&'a RasterSnapshot>,
    pub style_image: Option<&'a RasterSnapshot>,
    pub style_preset: Option<&'a StylePreset>,
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub resolution: Resolution,
}

/// What to ask the remote model for
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    /// Redraw `source` following `instruction`, optionally against a style reference
    ImageToImage {
        source: RasterSnapshot,
        instruction: String,
        style: Option<RasterSnapshot>,
        resolution: Resolution,
    },
    /// Create an image from text alone
    TextToImage { prompt: String, resolution: Resolution },
}

impl GenerationRequest {
    pub fn resolution(&self) -> Resolution {
        match self {
            Self::ImageToImage { resolution, .. } | Self::TextToImage { resolution, .. } => {
                *resolution
            }
        }
    }

    pub fn is_image_to_image(&self) -> bool {
        matches!(self, Self::ImageToImage { .. })
    }
}

/// Builds the sectioned instruction text for an image-to-image request.
///
/// The style comes from the style image if there is one, else from the
/// selected preset, else from the free-text prompt. When a style image or
/// preset defines the style, the prompt becomes a list of modifications.
pub fn compose_instruction(inputs: &GenerationInputs<'_>, edited: bool) -> String {
    let prompt = inputs.prompt.trim();
    let negative = inputs.negative_prompt.trim();

    let mut parts = vec![PRIMARY_GOAL.to_owned()];
    if edited {
        parts.push(EDIT_GUIDANCE.to_owned());
    }

    let (style, modifications) = if inputs.style_image.is_some() {
        (Some(STYLE_IMAGE_INSTRUCTION.to_owned()), modifications(prompt))
    } else if let Some(preset) = inputs.style_preset {
        (
            Some(format!(
                "Apply the following artistic style: \"{}\". Meticulously adhere to this style description.",
                preset.prompt
            )),
            modifications(prompt),
        )
    } else if !prompt.is_empty() {
        (
            Some(format!(
                "Apply the following artistic style: \"{}\". Your main objective is to faithfully recreate the visual characteristics of this style.",
                prompt
            )),
            None,
        )
    } else {
        (None, None)
    };

    if let Some(style) = style {
        parts.push(format!("# Style Instructions\n{}", style));
    }
    if let Some(modifications) = modifications {
        parts.push(format!("# Specific Modifications\n{}", modifications));
    }
    if !negative.is_empty() {
        parts.push(format!(
            "# Elements to Avoid\nStrictly avoid including any of the following: \"{}\".",
            negative
        ));
    }

    parts.join("\n\n")
}

fn modifications(prompt: &str) -> Option<String> {
    (!prompt.is_empty()).then(|| format!("Incorporate the following changes: \"{}\".", prompt))
}

/// Decides the generation mode and assembles the request.
///
/// An edit consumed from the session takes precedence over the content image
/// as source pixels. Without any source this is a text-to-image request,
/// which needs a non-empty prompt.
pub fn plan_request(
    inputs: &GenerationInputs<'_>,
    edit: Option<&ConsumedEdit>,
) -> Option<GenerationRequest> {
    let source = edit
        .map(|edit| edit.source.clone())
        .or_else(|| inputs.content.cloned());

    match source {
        Some(source) => Some(GenerationRequest::ImageToImage {
            source,
            instruction: compose_instruction(inputs, edit.is_some()),
            style: inputs.style_image.cloned(),
            resolution: inputs.resolution,
        }),
        None => {
            let prompt = inputs.prompt.trim();
            (!prompt.is_empty()).then(|| GenerationRequest::TextToImage {
                prompt: prompt.to_owned(),
                resolution: inputs.resolution,
            })
        }
    }
}

/// Whether the generate action is available.
///
/// `busy` is true while a previous request is still in flight.
pub fn can_generate(inputs: &GenerationInputs<'_>, session: &EditSession, busy: bool) -> bool {
    if busy {
        return false;
    }

    let has_prompt = !inputs.prompt.trim().is_empty();

    // Text-to-image
    if inputs.content.is_none() {
        return has_prompt;
    }

    // Image-to-image
    if session.is_active() && session.current_snapshot().is_none() {
        return false;
    }

    let has_style = inputs.style_image.is_some() || inputs.style_preset.is_some() || has_prompt;
    if !has_style {
        return false;
    }

    // Painted strokes need words to say what they are
    if session.has_painted_with_brush() {
        return has_prompt;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(prompt: &'a str, negative: &'a str) -> GenerationInputs<'a> {
        GenerationInputs {
            content: None,
            style_image: None,
            style_preset: None,
            prompt,
            negative_prompt: negative,
            resolution: Resolution::Square,
        }
    }

    #[test]
    fn test_only_primary_goal_without_style() {
        assert_eq!(compose_instruction(&inputs("  ", ""), false), PRIMARY_GOAL);
    }

    #[test]
    fn test_sections_are_separated_by_blank_lines() {
        let text = compose_instruction(&inputs("oil painting", "text"), false);
        let sections: Vec<_> = text.split("\n\n").collect();
        assert_eq!(sections.len(), 3);
        assert!(sections[1].starts_with("# Style Instructions\n"));
        assert!(sections[2].starts_with("# Elements to Avoid\n"));
    }
}
