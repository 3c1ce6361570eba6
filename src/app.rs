use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StylizeConfig;
use crate::export;
use crate::file_handler::{FileHandler, ImageTarget, LoadedImage};
use crate::generation::{
    Direction, GenerationHistory, GenerationInputs, GenerationJob, GenerationOutcome,
    ImageGenerator, Resolution, SlotUpdate, UnconfiguredGenerator, can_generate, plan_request,
    style_preset,
};
use crate::panels;
use crate::raster::RasterSnapshot;
use crate::state::{
    AutosaveTimer, EditAction, EditSession, SavedSession, StateStore, Transition,
    select_base_image,
};
use crate::texture_manager::TextureManager;
use crate::util::time;

const STATUS_SECS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Transient message shown at the bottom of the window
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    shown_at: f64,
}

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct StylizeApp {
    pub(crate) prompt: String,
    pub(crate) negative_prompt: String,
    pub(crate) selected_style: Option<String>,
    pub(crate) resolution: Resolution,
    pub(crate) session: EditSession,
    pub(crate) show_before: bool,
    pub(crate) export_dir: String,

    #[serde(skip)]
    pub(crate) content_image: Option<RasterSnapshot>,
    #[serde(skip)]
    pub(crate) style_image: Option<RasterSnapshot>,
    #[serde(skip)]
    pub(crate) generated: GenerationHistory,
    #[serde(skip)]
    pub(crate) textures: TextureManager,
    #[serde(skip)]
    pub(crate) file_handler: FileHandler,
    /// Path typed into the "open" field of each slot
    #[serde(skip)]
    pub(crate) path_inputs: [String; 2],
    #[serde(skip)]
    pub(crate) status: Option<StatusMessage>,
    #[serde(skip)]
    job: Option<GenerationJob>,
    #[serde(skip)]
    generator: Arc<dyn ImageGenerator>,
    #[serde(skip)]
    config: StylizeConfig,
    #[cfg(not(target_arch = "wasm32"))]
    #[serde(skip)]
    clipboard: crate::clipboard::SystemClipboard,
    #[serde(skip)]
    store: Option<StateStore>,
    #[serde(skip)]
    autosave: AutosaveTimer,
    /// Fingerprint of what was last saved or loaded
    #[serde(skip)]
    saved_fingerprint: u64,
}

impl Default for StylizeApp {
    fn default() -> Self {
        let config = StylizeConfig::default();
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            selected_style: None,
            resolution: Resolution::default(),
            session: EditSession::default(),
            show_before: false,
            export_dir: default_export_dir(),
            content_image: None,
            style_image: None,
            generated: GenerationHistory::new(),
            textures: TextureManager::new(config.texture_cache_size),
            file_handler: FileHandler::new(),
            path_inputs: Default::default(),
            status: None,
            job: None,
            generator: Arc::new(UnconfiguredGenerator),
            autosave: AutosaveTimer::new(config.autosave_delay_secs),
            store: None,
            #[cfg(not(target_arch = "wasm32"))]
            clipboard: crate::clipboard::SystemClipboard::new(),
            config,
            saved_fingerprint: 0,
        }
    }
}

impl StylizeApp {
    /// Called once before the first frame.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: StylizeConfig,
        generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        app.textures = TextureManager::new(config.texture_cache_size);
        app.autosave = AutosaveTimer::new(config.autosave_delay_secs);
        app.store = config.state_dir.clone().map(StateStore::new);
        app.config = config;
        app.generator = generator;
        log::info!("Using {} image backend", app.generator.name());

        app.restore_session();
        app
    }

    fn restore_session(&mut self) {
        let Some(store) = &mut self.store else {
            return;
        };
        match store.load() {
            Ok(Some(saved)) => {
                log::info!("Restored session with {} generated images", saved.generated.len());
                self.content_image = saved.content_image;
                self.style_image = saved.style_image;
                self.generated = saved.generated;
                self.prompt = saved.prompt;
                self.negative_prompt = saved.negative_prompt;
                self.selected_style = saved.selected_style.filter(|id| style_preset(id).is_some());
                self.resolution = saved.resolution;
                self.session.tools = saved.tools;
            }
            Ok(None) => log::info!("No saved session found"),
            Err(e) => {
                log::error!("Failed to load session: {}", e);
                self.set_error("Failed to load the saved session.");
            }
        }
        self.saved_fingerprint = self.fingerprint();
    }

    pub(crate) fn inputs(&self) -> GenerationInputs<'_> {
        GenerationInputs {
            content: self.content_image.as_ref(),
            style_image: self.style_image.as_ref(),
            style_preset: self.selected_style.as_deref().and_then(style_preset),
            prompt: &self.prompt,
            negative_prompt: &self.negative_prompt,
            resolution: self.resolution,
        }
    }

    /// True while a request is in flight
    pub(crate) fn is_busy(&self) -> bool {
        self.job.is_some() || self.generated.has_pending()
    }

    pub(crate) fn can_generate(&self) -> bool {
        can_generate(&self.inputs(), &self.session, self.is_busy())
    }

    pub(crate) fn generate(&mut self, ctx: &egui::Context) {
        if !self.can_generate() {
            log::warn!("Generate requested while unavailable");
            return;
        }

        let edit = self.session.consume_for_generation();
        self.textures.invalidate_canvas();

        let Some(request) = plan_request(&self.inputs(), edit.as_ref()) else {
            log::warn!("Nothing to generate from");
            return;
        };

        log::info!(
            "Starting {} generation at {}",
            if request.is_image_to_image() { "image-to-image" } else { "text-to-image" },
            request.resolution().value()
        );
        let ticket = self.generated.reserve_pending();
        self.show_before = false;
        self.job = Some(GenerationJob::spawn(
            self.generator.clone(),
            request,
            ticket,
            self.config.max_dimension,
            Some(ctx.clone()),
        ));
    }

    fn poll_generation(&mut self) {
        let Some(job) = &mut self.job else {
            return;
        };
        let Some(outcome) = job.poll() else {
            return;
        };

        let ticket = job.ticket();
        self.job = None;
        let reason = match &outcome {
            GenerationOutcome::Failure(reason) => Some(reason.clone()),
            GenerationOutcome::Success(_) => None,
        };

        match self.generated.resolve(ticket, outcome) {
            SlotUpdate::Replaced(index) => log::info!("Generation finished in slot {}", index),
            SlotUpdate::Removed(_) => self.set_error(format!(
                "Image generation failed: {}",
                reason.unwrap_or_default()
            )),
            SlotUpdate::Unknown => {
                log::warn!("Generation result arrived for a slot that no longer exists")
            }
        }
    }

    pub(crate) fn toggle_edit(&mut self) {
        if self.session.is_active() {
            self.apply_edit(EditAction::Cancel);
            return;
        }

        let base = select_base_image(self.generated.current(), self.content_image.as_ref());
        if self.apply_edit(EditAction::Enter { base }) == Transition::Refused {
            self.set_error("There is no image to edit yet.");
        }
    }

    pub(crate) fn apply_edit(&mut self, action: EditAction) -> Transition {
        let transition = self.session.apply(action);
        match transition {
            Transition::Cancelled | Transition::Entered => self.textures.invalidate_canvas(),
            Transition::StrokeCommitted(mode) => log::debug!("Committed {:?} stroke", mode),
            _ => {}
        }
        transition
    }

    pub(crate) fn navigate(&mut self, direction: Direction) {
        self.apply_edit(EditAction::Cancel);
        self.generated.navigate(direction);
        self.show_before = false;
    }

    /// Clears the generated results; inputs stay
    pub(crate) fn reset(&mut self) {
        self.apply_edit(EditAction::Cancel);
        // Dropping the job discards its result when it arrives
        self.job = None;
        self.generated.reset();
        log::info!("Generated images cleared");
    }

    pub(crate) fn toggle_style(&mut self, id: &str) {
        if self.selected_style.as_deref() == Some(id) {
            self.selected_style = None;
        } else {
            self.selected_style = Some(id.to_owned());
        }
    }

    pub(crate) fn set_image(&mut self, target: ImageTarget, image: Option<RasterSnapshot>) {
        match target {
            ImageTarget::Content => self.content_image = image,
            ImageTarget::Style => self.style_image = image,
        }
    }

    /// Puts the result at `index` into an input slot
    pub(crate) fn use_result_as(&mut self, index: usize, target: ImageTarget) {
        let Some(image) = self.generated.get(index).and_then(|slot| slot.image()) else {
            return;
        };
        let after = image.after.clone();
        self.apply_edit(EditAction::Cancel);
        log::info!("Using result {} as {} image", index + 1, target.label());
        self.set_image(target, Some(after));
    }

    /// Copies the result at `index` to the system clipboard
    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) fn copy_result(&mut self, index: usize) {
        let Some(image) = self.generated.get(index).and_then(|slot| slot.image()) else {
            return;
        };
        let after = image.after.clone();
        match self.clipboard.copy_image(&after) {
            Ok(()) => self.set_info("Image copied to clipboard"),
            Err(e) => {
                log::error!("Failed to copy image: {}", e);
                self.set_error("Failed to copy image to clipboard.");
            }
        }
    }

    pub(crate) fn open_path(&mut self, target: ImageTarget) {
        let slot = match target {
            ImageTarget::Content => 0,
            ImageTarget::Style => 1,
        };
        let path = PathBuf::from(self.path_inputs[slot].trim());
        match crate::file_handler::load_image_file(&path) {
            Ok(image) => {
                log::info!("Loaded {} image from {}", target.label(), path.display());
                self.set_image(target, Some(image));
            }
            Err(e) => {
                log::error!("Failed to open {}: {}", path.display(), e);
                self.set_error(format!("Could not open {}: {}", path.display(), e));
            }
        }
    }

    fn accept_dropped(&mut self, ctx: &egui::Context) {
        for LoadedImage { target, image, .. } in self.file_handler.take_dropped_images(ctx) {
            self.set_image(target, Some(image));
        }
    }

    pub(crate) fn export_all(&mut self) {
        let dir = PathBuf::from(self.export_dir.trim());
        match export::export_all(&dir, &self.generated) {
            Ok(written) => self.set_info(format!(
                "Exported {} images to {}",
                written.len(),
                dir.display()
            )),
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.set_error(format!("Export failed: {}", e));
            }
        }
    }

    fn saved_session(&self) -> SavedSession {
        SavedSession {
            content_image: self.content_image.clone(),
            style_image: self.style_image.clone(),
            generated: self.generated.clone(),
            prompt: self.prompt.clone(),
            negative_prompt: self.negative_prompt.clone(),
            selected_style: self.selected_style.clone(),
            resolution: self.resolution,
            tools: self.session.tools,
        }
    }

    pub(crate) fn save_now(&mut self) {
        self.autosave.reset();
        let session = self.saved_session();
        let Some(store) = &mut self.store else {
            log::warn!("Save requested but no state directory is configured");
            return;
        };
        match store.save(&session) {
            Ok(()) => {
                self.saved_fingerprint = self.fingerprint();
                self.set_info("Session saved");
            }
            Err(e) => {
                log::error!("Failed to save session: {}", e);
                self.set_error("Failed to save session.");
            }
        }
    }

    /// Schedules a save after the persisted fields stop changing
    fn autosave(&mut self, ctx: &egui::Context) {
        if self.store.is_none() {
            return;
        }
        let now = time::current_time_secs();
        let fingerprint = self.fingerprint();
        if fingerprint != self.saved_fingerprint {
            self.saved_fingerprint = fingerprint;
            self.autosave.mark_changed(now);
        }

        if self.autosave.is_due(now) {
            self.autosave.reset();
            let session = self.saved_session();
            if let Some(store) = &mut self.store {
                if let Err(e) = store.save(&session) {
                    log::error!("Autosave failed: {}", e);
                    self.set_error("Failed to save session.");
                }
            }
        } else if let Some(remaining) = self.autosave.remaining(now) {
            ctx.request_repaint_after(std::time::Duration::from_secs_f64(remaining));
        }
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.prompt.hash(&mut hasher);
        self.negative_prompt.hash(&mut hasher);
        self.selected_style.hash(&mut hasher);
        self.resolution.hash(&mut hasher);
        self.content_image.as_ref().map(RasterSnapshot::id).hash(&mut hasher);
        self.style_image.as_ref().map(RasterSnapshot::id).hash(&mut hasher);
        for image in self.generated.ready_images() {
            image.id.hash(&mut hasher);
        }
        self.generated.current_index().hash(&mut hasher);
        hasher.finish()
    }

    pub(crate) fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Info,
            shown_at: time::current_time_secs(),
        });
    }

    pub(crate) fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Error,
            shown_at: time::current_time_secs(),
        });
    }

    fn expire_status(&mut self) {
        if let Some(status) = &self.status {
            if time::current_time_secs() - status.shown_at > STATUS_SECS {
                self.status = None;
            }
        }
    }
}

impl eframe::App for StylizeApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.textures.begin_frame();
        self.poll_generation();
        self.accept_dropped(ctx);
        self.expire_status();

        panels::inputs_panel(self, ctx);
        panels::controls_panel(self, ctx);
        panels::status_bar(self, ctx);
        panels::central_panel(self, ctx);

        self.file_handler.preview_files_being_dropped(ctx);
        self.autosave(ctx);

        if self.status.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_secs(1));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.autosave.is_pending() {
            let session = self.saved_session();
            if let Some(store) = &mut self.store {
                if let Err(e) = store.save(&session) {
                    log::error!("Failed to save session on exit: {}", e);
                }
            }
        }
        if let Some(store) = &mut self.store {
            store.close();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_export_dir() -> String {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("styled-images").display().to_string())
        .unwrap_or_else(|| "styled-images".to_owned())
}

#[cfg(target_arch = "wasm32")]
fn default_export_dir() -> String {
    "styled-images".to_owned()
}
