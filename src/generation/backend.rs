use std::sync::Arc;

use futures::channel::oneshot;

use crate::error::GenerationError;
use crate::generation::history::{GeneratedImage, GenerationOutcome, Ticket};
use crate::generation::presets::Resolution;
use crate::generation::prompt::GenerationRequest;
use crate::raster::{self, RasterSnapshot};

/// The remote generative model, seen from this side as two blocking calls
pub trait ImageGenerator: Send + Sync {
    /// Return the name of the backend
    fn name(&self) -> &str;

    /// Redraws `source` following `instruction`, with an optional style reference
    fn edit_image(
        &self,
        source: &RasterSnapshot,
        instruction: &str,
        style: Option<&RasterSnapshot>,
    ) -> Result<RasterSnapshot, GenerationError>;

    /// Creates an image from text alone
    fn generate_image(
        &self,
        prompt: &str,
        resolution: Resolution,
    ) -> Result<RasterSnapshot, GenerationError>;
}

/// Backend used when nothing else is plugged in. Every request fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredGenerator;

impl ImageGenerator for UnconfiguredGenerator {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn edit_image(
        &self,
        _source: &RasterSnapshot,
        _instruction: &str,
        _style: Option<&RasterSnapshot>,
    ) -> Result<RasterSnapshot, GenerationError> {
        Err(GenerationError::Unconfigured)
    }

    fn generate_image(
        &self,
        _prompt: &str,
        _resolution: Resolution,
    ) -> Result<RasterSnapshot, GenerationError> {
        Err(GenerationError::Unconfigured)
    }
}

/// Runs one request to completion and folds the result into an outcome.
///
/// Image-to-image sources are cropped and scaled to the requested aspect
/// first; that processed image is kept as the "before" of the result.
pub fn run_request(
    generator: &dyn ImageGenerator,
    request: GenerationRequest,
    max_dimension: u32,
) -> GenerationOutcome {
    let result = match request {
        GenerationRequest::ImageToImage {
            source,
            instruction,
            style,
            resolution,
        } => {
            let before = raster::resize_and_pad(&source, resolution.aspect_ratio(), max_dimension);
            generator
                .edit_image(&before, &instruction, style.as_ref())
                .map(|after| GeneratedImage::new(after, Some(before)))
        }
        GenerationRequest::TextToImage { prompt, resolution } => generator
            .generate_image(&prompt, resolution)
            .map(|after| GeneratedImage::new(after, None)),
    };

    match result {
        Ok(image) => GenerationOutcome::Success(image),
        Err(e) => {
            log::error!("{} backend failed: {}", generator.name(), e);
            GenerationOutcome::Failure(e.to_string())
        }
    }
}

/// One in-flight request whose outcome arrives exactly once
pub struct GenerationJob {
    ticket: Ticket,
    receiver: oneshot::Receiver<GenerationOutcome>,
}

impl GenerationJob {
    /// Starts `request` off the UI thread. `repaint` is poked once the outcome is ready.
    pub fn spawn(
        generator: Arc<dyn ImageGenerator>,
        request: GenerationRequest,
        ticket: Ticket,
        max_dimension: u32,
        repaint: Option<egui::Context>,
    ) -> Self {
        let (sender, receiver) = oneshot::channel();
        let work = move || {
            let outcome = run_request(generator.as_ref(), request, max_dimension);
            // The receiver is gone if the job was dropped (e.g. reset); nothing to deliver to
            let _ = sender.send(outcome);
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Err(e) = std::thread::Builder::new()
                .name("generation".to_owned())
                .spawn(work)
            {
                // The sender went down with the closure, so poll() reports the failure
                log::error!("Failed to start generation worker: {}", e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move { work() });

        Self { ticket, receiver }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// The outcome if it has arrived. Drop the job once this yields `Some`.
    pub fn poll(&mut self) -> Option<GenerationOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(GenerationOutcome::Failure(
                GenerationError::Dropped.to_string(),
            )),
        }
    }

    /// Blocks until the outcome arrives
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait(self) -> GenerationOutcome {
        futures::executor::block_on(self.receiver)
            .unwrap_or_else(|_| GenerationOutcome::Failure(GenerationError::Dropped.to_string()))
    }
}
