//! Error types for CAD model rendering.

use std::path::PathBuf;

use crate::kernel::KernelFailure;

/// Error raised while evaluating, selecting or exporting a model.
///
/// Every variant is recoverable: directives turn it into an error node and
/// the page build carries on.
#[derive(Debug, thiserror::Error)]
pub enum CadError {
    /// The kernel failed to build the script.
    #[error("{0}")]
    ScriptEvaluation(#[from] KernelFailure),

    /// Selection key not bound by the script.
    #[error("no object named \"{0}\" in the script environment")]
    UnknownSelection(String),

    /// Selected value has no geometry to draw.
    #[error("nothing to render; use show_object() to mark the value to display")]
    NoRenderableResult,

    /// Directive body does not have the required block layout.
    #[error("{message}")]
    StructuralContent {
        /// Directive name as written in the document.
        directive: String,
        /// Description of the required layout.
        message: String,
    },

    /// Script file referenced by the directive does not exist.
    #[error("file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    /// I/O error while reading a script or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
