use std::path::PathBuf;

use thiserror::Error;

/// Failures at the edges of the indicator: font files and the host window.
///
/// Angle updates, composition and caching never fail.
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("failed to read font {path}: {source}")]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a usable TrueType/OpenType font")]
    FontParse { path: PathBuf },
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("surface error: {0}")]
    Surface(#[from] pixels::Error),
    #[error("surface resize failed: {0}")]
    Resize(#[from] pixels::TextureError),
}
