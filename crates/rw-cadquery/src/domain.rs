//! The `cadquery` directive domain.
//!
//! Registers every directive name on a [`CadProcessor`] and resolves the
//! SVG images figures leave pending until the page is complete.

use std::fs;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

use crate::directive::{
    CadProcessor, CadSettings, FigureSvgDirective, FigureVtkDirective, Legacy, PageInfo,
    PostParseHook, SvgDirective, VtkDirective,
};
use crate::error::CadError;
use crate::export::render_svg;
use crate::node::{ImageUri, Node};

/// Directory under the output root receiving exported SVG files.
pub const EXPORT_DIR: &str = "_static/cadquery-exports";

/// Deferred SVG export recorded by a figure directive.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPlaceholder {
    /// Directive name, for error messages.
    pub directive: String,
    /// Script to evaluate.
    pub source: String,
    /// Environment key to render.
    pub select: String,
    /// Embed the SVG as a data URI instead of writing a file.
    pub inline_uri: bool,
    /// Page line of the script, for error messages.
    pub line: usize,
}

/// Content-addressed file name for an exported script.
///
/// ```
/// use rw_cadquery::domain::export_file_name;
///
/// let name = export_file_name("result = box(1, 1, 1)");
/// assert_eq!(name.len(), 12);
/// assert!(name.ends_with(".svg"));
/// ```
#[must_use]
pub fn export_file_name(source: &str) -> String {
    let digest = hex::encode(Sha1::digest(source.as_bytes()));
    format!("{}.svg", &digest[..8])
}

/// Directive domain for CAD scripts.
pub struct CadQueryDomain {
    settings: CadSettings,
    output_dir: PathBuf,
}

impl CadQueryDomain {
    pub const NAME: &'static str = "cadquery";

    /// Create the domain; exported files land under `output_dir`.
    #[must_use]
    pub fn new(settings: CadSettings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
        }
    }

    /// Register all directives and the SVG resolver on `processor`.
    #[must_use]
    pub fn register(self, processor: CadProcessor) -> CadProcessor {
        let settings = self.settings;
        processor
            .with_directive(FigureSvgDirective::new(settings.clone()))
            .with_directive(FigureVtkDirective::new(settings.clone()))
            .with_directive(SvgDirective::new(settings.clone()))
            .with_directive(VtkDirective::new(settings.clone()))
            .with_directive(Legacy::new("cq_plot", SvgDirective::new(settings.clone())))
            .with_directive(Legacy::new("cadquery", VtkDirective::new(settings.clone())))
            .with_hook(SvgResolver::new(settings, self.output_dir))
    }
}

/// Post-parse hook exporting pending figure images.
pub struct SvgResolver {
    settings: CadSettings,
    output_dir: PathBuf,
    warnings: Vec<String>,
}

impl SvgResolver {
    #[must_use]
    pub fn new(settings: CadSettings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
            warnings: Vec::new(),
        }
    }

    fn export(&self, placeholder: &SvgPlaceholder, depth: usize) -> Result<String, CadError> {
        let svg = render_svg(
            self.settings.kernel.as_ref(),
            &placeholder.source,
            &placeholder.select,
        )?;

        if placeholder.inline_uri {
            return Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)));
        }

        let name = export_file_name(&placeholder.source);
        let dir = self.output_dir.join(EXPORT_DIR);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(&name), svg)?;
        tracing::debug!(file = %name, "Exported SVG");

        Ok(format!("{}{EXPORT_DIR}/{name}", "../".repeat(depth)))
    }

    fn resolve_node(&mut self, node: &mut Node, page: &PageInfo<'_>) {
        let Node::Image {
            uri: ImageUri::Pending(placeholder),
            ..
        } = &*node
        else {
            return;
        };
        let placeholder = placeholder.clone();

        match self.export(&placeholder, page.depth) {
            Ok(uri) => {
                if let Node::Image { uri: slot, .. } = node {
                    *slot = ImageUri::Resolved(uri);
                }
            }
            Err(err) => {
                let message =
                    format!("Script error in {} directive: {err}.", placeholder.directive);
                let detail = format!("{} on line {}.", page.page_name(), placeholder.line);
                tracing::error!(
                    directive = %placeholder.directive,
                    path = %page.page_name(),
                    line = placeholder.line,
                    "{message}"
                );
                self.warnings
                    .push(format!("{}:{}: {message}", page.page_name(), placeholder.line));
                *node = Node::error(message, detail);
            }
        }
    }
}

impl PostParseHook for SvgResolver {
    fn resolve(&mut self, blocks: &mut [Vec<Node>], page: &PageInfo<'_>) {
        for nodes in blocks {
            for node in nodes {
                node.walk_mut(&mut |n| self.resolve_node(n, page));
            }
        }
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
