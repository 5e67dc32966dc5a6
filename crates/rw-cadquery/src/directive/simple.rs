//! `cadquery-svg` and `cadquery-vtk`: render a script straight into the page.

use super::markup::{inline_svg, vtk_container};
use super::{
    CadDirective, CadSettings, DirectiveBlock, DirectiveContext, gather_source, report_error,
};
use crate::export::{render_scene, render_svg};
use crate::geometry::DEFAULT_COLOR;
use crate::node::Node;
use crate::options::{DirectiveOptions, OptionKey};

const SVG_OPTIONS: &[OptionKey] = &[OptionKey::Align, OptionKey::IncludeSource, OptionKey::Select];

const VTK_OPTIONS: &[OptionKey] = &[
    OptionKey::Align,
    OptionKey::Color,
    OptionKey::Height,
    OptionKey::IncludeSource,
    OptionKey::Select,
    OptionKey::Width,
];

pub(crate) const DEFAULT_HEIGHT: &str = "500px";
pub(crate) const DEFAULT_WIDTH: &str = "100%";

/// Alignment container followed by the optional source listing.
fn wrap(
    options: &DirectiveOptions,
    style: Option<String>,
    rendered: Node,
    listing: Option<&str>,
) -> Vec<Node> {
    let align = options.align.unwrap_or_default();
    let mut nodes = vec![Node::Container {
        classes: vec!["cadquery".to_owned(), format!("align-{align}")],
        style,
        children: vec![rendered],
    }];
    if let Some(source) = listing {
        nodes.push(Node::source_listing(source));
    }
    nodes
}

/// Inline SVG drawing of a script's result.
pub struct SvgDirective {
    settings: CadSettings,
    warnings: Vec<String>,
}

impl SvgDirective {
    pub const NAME: &'static str = "cadquery-svg";

    #[must_use]
    pub fn new(settings: CadSettings) -> Self {
        Self {
            settings,
            warnings: Vec::new(),
        }
    }
}

impl CadDirective for SvgDirective {
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
        let rendered = gather_source(block, ctx).and_then(|source| {
            let svg = render_svg(self.settings.kernel.as_ref(), &source, options.select_key())?;
            Ok((source, svg))
        });

        match rendered {
            Ok((source, svg)) => {
                let listing = options
                    .include_source(self.settings.include_source)
                    .then_some(source.as_str());
                wrap(options, None, Node::Raw(inline_svg(&svg).to_owned()), listing)
            }
            Err(err) => vec![report_error(&mut self.warnings, &block.name, ctx, &err)],
        }
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Interactive 3D viewer of a script's result.
pub struct VtkDirective {
    settings: CadSettings,
    warnings: Vec<String>,
}

impl VtkDirective {
    pub const NAME: &'static str = "cadquery-vtk";

    #[must_use]
    pub fn new(settings: CadSettings) -> Self {
        Self {
            settings,
            warnings: Vec::new(),
        }
    }
}

impl CadDirective for VtkDirective {
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
        let color = options.color.unwrap_or(DEFAULT_COLOR);
        let rendered = gather_source(block, ctx).and_then(|source| {
            let json = render_scene(
                self.settings.kernel.as_ref(),
                &source,
                options.select_key(),
                color,
            )?;
            Ok((source, json))
        });

        match rendered {
            Ok((source, json)) => {
                let height = options.height.as_deref().unwrap_or(DEFAULT_HEIGHT);
                let width = options.width.as_deref().unwrap_or(DEFAULT_WIDTH);
                let listing = options
                    .include_source(self.settings.include_source)
                    .then_some(source.as_str());
                wrap(
                    options,
                    Some(format!("width: {width}")),
                    Node::Raw(vtk_container(&json, height)),
                    listing,
                )
            }
            Err(err) => vec![report_error(&mut self.warnings, &block.name, ctx, &err)],
        }
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
