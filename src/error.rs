//! Errors raised by the frame transform.

/// Failures of the deterministic image to ASCII transform.
///
/// None of these are retriable: the same frame and settings always fail the
/// same way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AsciiError {
    /// The requested density cannot subdivide the frame.
    #[error(
        "resolution {width}x{height} is too low for {columns} columns ({rows} rows); \
         lower --columns or raise --scale"
    )]
    InvalidGeometry {
        width: u32,
        height: u32,
        columns: u32,
        rows: u64,
    },

    /// Nothing to convert or assemble.
    #[error("no frames to process: {0}")]
    EmptyInput(String),

    #[error("invalid ramp: {0}")]
    InvalidRamp(String),

    #[error("failed to load font: {0}")]
    Font(String),
}
