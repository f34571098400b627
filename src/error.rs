//! Error types for the harvester

use thiserror::Error;

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while collecting, extracting or rasterizing icons
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to start the rendering backend
    #[error("Oracle initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a URL or a staged document
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to measure or capture content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to evaluate a page script or decode its result
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The listing page yielded no item links
    #[error("No item slugs found on {0}")]
    NoSlugs(String),

    /// No rendered svg on the detail page passed the width filter
    #[error("No suitable graphic (none at least {min_width}px wide among {candidates} candidates)")]
    NoSuitableGraphic { min_width: f64, candidates: usize },

    /// Markup could not be interpreted as an svg graphic
    #[error("Invalid graphic markup: {0}")]
    InvalidGraphic(String),

    /// The staged graphic rendered with a zero or non-finite box
    #[error("Degenerate bounding box {width}x{height}")]
    DegenerateGraphic { width: f64, height: f64 },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error must abort the whole run rather than skip one item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InitializationError(_) | Error::ConfigError(_) | Error::NoSlugs(_)
        )
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}
