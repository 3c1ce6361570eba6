pub mod backend;
#[cfg(not(target_arch = "wasm32"))]
pub mod gemini;
pub mod history;
pub mod presets;
pub mod prompt;

pub use backend::{GenerationJob, ImageGenerator, UnconfiguredGenerator, run_request};
#[cfg(not(target_arch = "wasm32"))]
pub use gemini::GeminiGenerator;
pub use history::{
    Direction, GeneratedImage, GenerationHistory, GenerationOutcome, GenerationSlot, SlotState,
    SlotUpdate, Ticket,
};
pub use presets::{Resolution, STYLE_PRESETS, StylePreset, style_preset};
pub use prompt::{
    GenerationInputs, GenerationRequest, can_generate, compose_instruction, plan_request,
};
