//! CAD model directives for markdown pages.
//!
//! Directives use container syntax and hold either a script or a small
//! markdown document with a code block:
//!
//! ```text
//! :::cadquery-vtk{height="300px"}
//! import cadquery as cq
//! result = cq.Workplane().box(1, 2, 3)
//! :::
//! ```
//!
//! # Architecture
//!
//! Processing has two phases:
//!
//! 1. **Preprocessing** ([`CadProcessor::process`]): each registered block
//!    runs its directive, which returns [`Node`]s. The block is replaced by
//!    a placeholder comment that pulldown-cmark passes through unchanged.
//!
//! 2. **Post-processing** ([`CadProcessor::post_process`]): post-parse hooks
//!    rewrite the collected nodes (the deferred SVG export), then each
//!    placeholder is replaced by its rendered nodes.
//!
//! # Directive families
//!
//! - **Simple** ([`SvgDirective`], [`VtkDirective`]): body is the script,
//!   or a bracket argument names a script file.
//! - **Figure** ([`FigureSvgDirective`], [`FigureVtkDirective`]): body is a
//!   caption, a code block with the script, and optional notes.
//! - **Legacy** ([`Legacy`]): deprecated names delegating to a simple
//!   directive.

mod args;
mod content;
mod context;
mod fence;
mod figure;
mod legacy;
mod markup;
mod parser;
mod processor;
mod simple;

use std::io;
use std::sync::Arc;

pub use args::DirectiveArgs;
pub use context::DirectiveContext;
pub use figure::{FigureSvgDirective, FigureVtkDirective};
pub use legacy::Legacy;
pub use processor::{CadProcessor, CadProcessorConfig, PageInfo, PostParseHook, ReadFileFn};
pub use simple::{SvgDirective, VtkDirective};

use crate::error::CadError;
use crate::kernel::Kernel;
use crate::node::Node;
use crate::options::{DirectiveOptions, OptionKey};

/// Build-wide settings shared by all directives.
#[derive(Clone)]
pub struct CadSettings {
    /// Kernel evaluating every script.
    pub kernel: Arc<dyn Kernel>,
    /// Default for the `include-source` option.
    pub include_source: bool,
}

impl CadSettings {
    #[must_use]
    pub fn new(kernel: Arc<dyn Kernel>) -> Self {
        Self {
            kernel,
            include_source: true,
        }
    }

    #[must_use]
    pub fn with_include_source(mut self, include_source: bool) -> Self {
        self.include_source = include_source;
        self
    }
}

/// One `:::name` ... `:::` block as found in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBlock {
    /// Directive name as written.
    pub name: String,
    pub args: DirectiveArgs,
    /// Lines between the opening and closing markers, joined with `\n`.
    pub body: String,
    /// Full block text including the markers.
    pub text: String,
}

/// Handler for one directive name.
///
/// Handlers are `Send` only; each page gets its own processor.
pub trait CadDirective: Send {
    /// Directive name matched against `:::name`.
    fn name(&self) -> &str;

    /// Options this directive accepts; others are rejected before `run`.
    fn option_keys(&self) -> &[OptionKey];

    /// Produce output nodes for a block.
    ///
    /// Failures are reported as [`Node::Error`] in the returned list.
    fn run(
        &mut self,
        block: &DirectiveBlock,
        options: &DirectiveOptions,
        ctx: &DirectiveContext,
    ) -> Vec<Node>;

    /// Errors reported while running.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Script text of a simple-family block: the bracket file, else the body.
pub(crate) fn gather_source(
    block: &DirectiveBlock,
    ctx: &DirectiveContext,
) -> Result<String, CadError> {
    if block.args.argument.is_empty() {
        return Ok(block.body.clone());
    }

    let path = ctx.resolve_path(&block.args.argument);
    ctx.read(&path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CadError::MissingFile(path)
        } else {
            CadError::Io(e)
        }
    })
}

/// Log `err`, record it as a warning and build its error node.
pub(crate) fn report_error(
    warnings: &mut Vec<String>,
    directive: &str,
    ctx: &DirectiveContext,
    err: &CadError,
) -> Node {
    let kind = match err {
        CadError::ScriptEvaluation(_) => "Script error",
        CadError::MissingFile(_) | CadError::Io(_) => "File error",
        _ => "Render error",
    };
    let message = format!("{kind} in {directive} directive:");
    let detail = format!("{err}.");

    tracing::error!(
        directive,
        path = %ctx.page_name(),
        line = ctx.line,
        "{message} {detail}"
    );
    warnings.push(format!("{}: {message} {detail}", ctx.location()));

    Node::error(message, detail)
}
