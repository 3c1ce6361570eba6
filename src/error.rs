use thiserror::Error;

/// Errors raised while decoding, encoding or reshaping raster images
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Failure reported by the remote generation collaborator
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// No backend is plugged in
    #[error("No image generation backend is configured (set GEMINI_API_KEY)")]
    Unconfigured,

    /// The service refused the request, e.g. a safety filter
    #[error("Request blocked: {0}")]
    Blocked(String),

    /// The service answered without any image data
    #[error("No image data in the response: {0}")]
    NoImage(String),

    #[error("Generation failed: {0}")]
    Failed(String),

    /// The worker delivering the result went away before answering
    #[error("Generation worker dropped the request")]
    Dropped,
}

impl From<RasterError> for GenerationError {
    fn from(error: RasterError) -> Self {
        GenerationError::Failed(error.to_string())
    }
}

/// Problems reading `stylize.json`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Problems writing the exported images
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    NothingToExport,

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Why an opened or dropped file could not become an image
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("Dropped file carries neither bytes nor a path")]
    NoData,
}
