#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
#[cfg(not(target_arch = "wasm32"))]
pub mod clipboard;
pub mod command;
pub mod config;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod generation;
pub mod geometry;
pub mod id_generator;
pub mod panels;
pub mod raster;
pub mod state;
pub mod stroke;
pub mod texture_manager;
pub mod tools;
pub mod util;

pub use app::StylizeApp;
pub use command::EditHistory;
pub use config::StylizeConfig;
pub use raster::{RasterBuffer, RasterSnapshot};
pub use state::{EditAction, EditSession, Transition};
