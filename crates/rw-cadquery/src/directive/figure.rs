//! `cadquery:svg` and `cadquery:vtk`: models rendered inside a figure.
//!
//! The body is markdown with a required layout:
//!
//! ````text
//! :::cadquery:vtk{figwidth="60%"}
//! A bracket with two mounting holes.
//!
//! ```python
//! holes = [(-1.5, 0), (1.5, 0)]
//! result = cq.Workplane().box(4, 2, 0.5).faces(">Z").workplane().pushPoints(holes).hole(0.25)
//! ```
//!
//! Notes rendered under the figure.
//! :::
//! ````
//!
//! The first block is the caption (a paragraph, or `<!-- -->` for none), the
//! second is the script, and anything after it is notes.

use super::content::{ContentBlock, parse_blocks};
use super::markup::{SVG_OVERLAY, vtk_container};
use super::simple::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use super::{CadDirective, CadSettings, DirectiveBlock, DirectiveContext, report_error};
use crate::domain::SvgPlaceholder;
use crate::error::CadError;
use crate::export::render_scene;
use crate::geometry::DEFAULT_COLOR;
use crate::node::{ImageUri, Node};
use crate::options::{DirectiveOptions, OptionKey};

const MSG_TWO_OR_MORE: &str = "must be composed of 2 or more nodes.";
const MSG_CAPTION_NODE: &str = "First node must be either a paragraph or empty comment.";
const MSG_SOURCE_NODE: &str = "Second node must be a code block.";

/// Default `alt` text of exported figure images.
pub const DEFAULT_ALT: &str = "SVG image exported by CadQuery.";

const SVG_OPTIONS: &[OptionKey] = &[
    OptionKey::Align,
    OptionKey::Alt,
    OptionKey::FigClass,
    OptionKey::FigWidth,
    OptionKey::IncludeSource,
    OptionKey::InlineUri,
    OptionKey::Name,
    OptionKey::Select,
];

const VTK_OPTIONS: &[OptionKey] = &[
    OptionKey::Align,
    OptionKey::Color,
    OptionKey::FigClass,
    OptionKey::FigWidth,
    OptionKey::Height,
    OptionKey::IncludeSource,
    OptionKey::Name,
    OptionKey::Select,
];

/// Figure body split into its parts.
#[derive(Debug)]
struct FigureContent {
    caption: Option<String>,
    source: String,
    /// Line of the code block, 0-indexed within the body.
    source_line: usize,
    notes: Option<String>,
}

impl FigureContent {
    fn parse(block: &DirectiveBlock) -> Result<Self, CadError> {
        let structural = |message: String| CadError::StructuralContent {
            directive: block.name.clone(),
            message,
        };

        let mut blocks = parse_blocks(&block.body).into_iter();
        let (Some(first), Some(second)) = (blocks.next(), blocks.next()) else {
            return Err(structural(format!(
                "Directive {} {MSG_TWO_OR_MORE}\n{MSG_CAPTION_NODE}\n{MSG_SOURCE_NODE}",
                block.name
            )));
        };

        let caption = match first {
            ContentBlock::Paragraph(html) => Some(html),
            ContentBlock::Comment => None,
            _ => return Err(structural(MSG_CAPTION_NODE.to_owned())),
        };
        let ContentBlock::Code { text, line } = second else {
            return Err(structural(MSG_SOURCE_NODE.to_owned()));
        };

        let notes: String = blocks
            .map(|b| match b {
                ContentBlock::Paragraph(html) => format!("<p>{html}</p>\n"),
                ContentBlock::Other(html) => html,
                ContentBlock::Comment => String::new(),
                ContentBlock::Code { text, .. } => {
                    let mut out = String::new();
                    Node::LiteralBlock { language: None, text }.render(&mut out);
                    out
                }
            })
            .collect();

        Ok(Self {
            caption,
            source: text,
            source_line: line,
            notes: (!notes.is_empty()).then_some(notes),
        })
    }
}

/// Empty figure carrying the layout options.
fn figure_shell(options: &DirectiveOptions) -> Node {
    let mut classes = vec!["cadquery-container".to_owned()];
    classes.extend(options.figclass.iter().cloned());
    Node::Figure {
        id: options.name.clone(),
        align: options.align,
        classes,
        width: Some(options.figwidth.clone().unwrap_or_else(|| DEFAULT_WIDTH.to_owned())),
        children: Vec::new(),
    }
}

/// Fill `figure` with the view, caption, listing and notes, in that order.
fn populate(mut figure: Node, view: Node, content: FigureContent, include_source: bool) -> Node {
    if let Node::Figure { children, .. } = &mut figure {
        children.push(view);
        if let Some(caption) = content.caption {
            children.push(Node::Caption(caption));
        }
        if include_source {
            children.push(Node::source_listing(&content.source));
        }
        if let Some(notes) = content.notes {
            children.push(Node::container(&["cadquery-notes"], vec![Node::Raw(notes)]));
        }
    }
    figure
}

/// Figure shell followed by an error quoting the whole block.
fn structural_error(
    warnings: &mut Vec<String>,
    block: &DirectiveBlock,
    options: &DirectiveOptions,
    ctx: &DirectiveContext,
    err: &CadError,
) -> Vec<Node> {
    let message = err.to_string();
    tracing::error!(
        directive = %block.name,
        path = %ctx.page_name(),
        line = ctx.line,
        "{}",
        message.replace('\n', " ")
    );
    warnings.push(format!("{}: {}", ctx.location(), message.replace('\n', " ")));

    vec![
        figure_shell(options),
        Node::Error {
            message,
            detail: String::new(),
            literal: Some(block.text.clone()),
        },
    ]
}

/// Figure with an SVG image, exported after the page is parsed.
pub struct FigureSvgDirective {
    settings: CadSettings,
    warnings: Vec<String>,
}

impl FigureSvgDirective {
    pub const NAME: &'static str = "cadquery:svg";

    #[must_use]
    pub fn new(settings: CadSettings) -> Self {
        Self {
            settings,
            warnings: Vec::new(),
        }
    }
}

impl CadDirective for FigureSvgDirective {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn option_keys(&self) -> &[OptionKey] {
        SVG_OPTIONS
    }

    fn run(
        &mut self,
        block: &DirectiveBlock,
        options: &DirectiveOptions,
        ctx: &DirectiveContext,
    ) -> Vec<Node> {
        let content = match FigureContent::parse(block) {
            Ok(content) => content,
            Err(err) => return structural_error(&mut self.warnings, block, options, ctx, &err),
        };

        let image = Node::Image {
            uri: ImageUri::Pending(SvgPlaceholder {
                directive: block.name.clone(),
                source: content.source.clone(),
                select: options.select_key().to_owned(),
                inline_uri: options.inline_uri,
                line: ctx.line + 1 + content.source_line,
            }),
            alt: options.alt.clone().unwrap_or_else(|| DEFAULT_ALT.to_owned()),
        };
        let view = Node::container(
            &["cadquery-container-model"],
            vec![image, Node::Raw(SVG_OVERLAY.to_owned())],
        );

        let include_source = options.include_source(self.settings.include_source);
        vec![populate(figure_shell(options), view, content, include_source)]
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Figure with an interactive 3D viewer.
pub struct FigureVtkDirective {
    settings: CadSettings,
    warnings: Vec<String>,
}

impl FigureVtkDirective {
    pub const NAME: &'static str = "cadquery:vtk";

    #[must_use]
    pub fn new(settings: CadSettings) -> Self {
        Self {
            settings,
            warnings: Vec::new(),
        }
    }
}

impl CadDirective for FigureVtkDirective {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn option_keys(&self) -> &[OptionKey] {
        VTK_OPTIONS
    }

    fn run(
        &mut self,
        block: &DirectiveBlock,
        options: &DirectiveOptions,
        ctx: &DirectiveContext,
    ) -> Vec<Node> {
        let content = match FigureContent::parse(block) {
            Ok(content) => content,
            Err(err) => return structural_error(&mut self.warnings, block, options, ctx, &err),
        };

        let color = options.color.unwrap_or(DEFAULT_COLOR);
        let height = options.height.as_deref().unwrap_or(DEFAULT_HEIGHT);
        let view = match render_scene(
            self.settings.kernel.as_ref(),
            &content.source,
            options.select_key(),
            color,
        ) {
            Ok(json) => Node::container(
                &["cadquery-container-model"],
                vec![Node::Raw(vtk_container(&json, height))],
            ),
            Err(err) => report_error(&mut self.warnings, &block.name, ctx, &err),
        };

        let include_source = options.include_source(self.settings.include_source);
        vec![populate(figure_shell(options), view, content, include_source)]
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
