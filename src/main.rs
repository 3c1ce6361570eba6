#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::sync::Arc;

use eframe_stylize::generation::UnconfiguredGenerator;
use eframe_stylize::{StylizeApp, StylizeConfig};

/// The Gemini backend when an API key is set, else one that refuses every request
#[cfg(not(target_arch = "wasm32"))]
fn image_generator() -> Arc<dyn eframe_stylize::generation::ImageGenerator> {
    use eframe_stylize::generation::{GeminiGenerator, gemini};

    match GeminiGenerator::from_env() {
        Some(generator) => Arc::new(generator),
        None => {
            log::warn!("{} is not set, image generation is disabled", gemini::API_KEY_ENV);
            Arc::new(UnconfiguredGenerator)
        }
    }
}

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = StylizeConfig::load().unwrap_or_else(|e| {
        log::error!("{}, using defaults", e);
        StylizeConfig::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Stylize",
        native_options,
        Box::new(|cc| Ok(Box::new(StylizeApp::new(cc, config, image_generator())))),
    )
}

// When compiling to web using trunk:
#[cfg(target_arch = "wasm32")]
fn main() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` message to `console.log` and friends:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("the_canvas_id"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("Failed to find the_canvas_id canvas element");
            return;
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| {
                    Ok(Box::new(StylizeApp::new(
                        cc,
                        StylizeConfig::default(),
                        Arc::new(UnconfiguredGenerator),
                    )))
                }),
            )
            .await;

        if let Err(e) = start_result {
            log::error!("Failed to start eframe: {e:?}");
        }
    });
}
