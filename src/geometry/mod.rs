pub mod mapping;

pub use mapping::{CoordinateMapper, fit_centered};
