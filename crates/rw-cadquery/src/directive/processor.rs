//! Block scanner and placeholder replacement.
//!
//! Handles preprocessing (before pulldown-cmark) and post-processing (after
//! rendering) of CAD directive blocks.

use std::io;
use std::path::{Path, PathBuf};

use super::fence::FenceTracker;
use super::parser::{ContainerLine, parse_container_line};
use super::{CadDirective, DirectiveBlock, DirectiveContext};
use crate::node::{Node, render_nodes};
use crate::options::DirectiveOptions;

/// Prefix of the comment standing in for a processed block.
const PLACEHOLDER_PREFIX: &str = "<!--rw-cadquery:";
const PLACEHOLDER_SUFFIX: &str = "-->";

/// Type alias for the file reading callback function.
pub type ReadFileFn = dyn Fn(&Path) -> io::Result<String> + Send;

/// Page location for the processor.
pub struct CadProcessorConfig {
    /// Documentation source root.
    pub source_root: PathBuf,
    /// Page being rendered, absolute or relative to `source_root`.
    pub source_path: Option<PathBuf>,
    /// Callback to read files. Default: `std::fs::read_to_string`.
    pub read_file: Option<Box<ReadFileFn>>,
}

impl Default for CadProcessorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CadProcessorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source_root: PathBuf::from("."),
            source_path: None,
            read_file: None,
        }
    }

    #[must_use]
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = source_root.into();
        self
    }

    #[must_use]
    pub fn with_source_path(mut self, source_path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }

    #[must_use]
    pub fn with_read_file<F>(mut self, read_file: F) -> Self
    where
        F: Fn(&Path) -> io::Result<String> + Send + 'static,
    {
        self.read_file = Some(Box::new(read_file));
        self
    }

    /// Directory levels between the source root and the page.
    #[must_use]
    pub fn depth(&self) -> usize {
        let Some(path) = &self.source_path else {
            return 0;
        };
        let relative = path.strip_prefix(&self.source_root).unwrap_or(path);
        if relative.is_absolute() {
            return 0;
        }
        relative.parent().map_or(0, |dir| dir.components().count())
    }

    fn page(&self) -> PageInfo<'_> {
        PageInfo {
            source_path: self.source_path.as_deref(),
            depth: self.depth(),
        }
    }

    fn create_context(&self, line: usize) -> DirectiveContext<'_> {
        let read_file: &dyn Fn(&Path) -> io::Result<String> = match &self.read_file {
            Some(f) => f.as_ref(),
            None => &default_read_file,
        };
        DirectiveContext {
            source_path: self.source_path.as_deref(),
            source_root: &self.source_root,
            line,
            read_file,
        }
    }
}

fn default_read_file(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
}

/// Page information handed to post-parse hooks.
#[derive(Debug, Clone, Copy)]
pub struct PageInfo<'a> {
    pub source_path: Option<&'a Path>,
    pub depth: usize,
}

impl PageInfo<'_> {
    /// Page path for messages, `<unknown>` when not set.
    #[must_use]
    pub fn page_name(&self) -> String {
        self.source_path
            .map_or_else(|| "<unknown>".to_owned(), |p| p.display().to_string())
    }
}

/// Pass over all emitted nodes, run once per page before rendering.
pub trait PostParseHook: Send {
    fn resolve(&mut self, blocks: &mut [Vec<Node>], page: &PageInfo<'_>);

    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Processor for CAD directive blocks.
///
/// ```
/// use std::sync::Arc;
/// use rw_cadquery::directive::{CadProcessor, CadSettings, VtkDirective};
/// use rw_cadquery::kernel::ProcessKernel;
///
/// let kernel = Arc::new(ProcessKernel::new("cq-eval", Vec::new()));
/// let mut processor = CadProcessor::new()
///     .with_directive(VtkDirective::new(CadSettings::new(kernel)));
///
/// // Unregistered directives pass through untouched
/// let output = processor.process(":::note\nHello\n:::\n");
/// assert_eq!(output, ":::note\nHello\n:::\n");
/// ```
pub struct CadProcessor {
    config: CadProcessorConfig,
    directives: Vec<Box<dyn CadDirective>>,
    hooks: Vec<Box<dyn PostParseHook>>,
    blocks: Vec<Vec<Node>>,
    warnings: Vec<String>,
}

impl Default for CadProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CadProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CadProcessorConfig::default())
    }

    #[must_use]
    pub fn with_config(config: CadProcessorConfig) -> Self {
        Self {
            config,
            directives: Vec::new(),
            hooks: Vec::new(),
            blocks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Register a directive handler.
    #[must_use]
    pub fn with_directive<D: CadDirective + 'static>(mut self, directive: D) -> Self {
        self.directives.push(Box::new(directive));
        self
    }

    /// Register a post-parse hook.
    #[must_use]
    pub fn with_hook<H: PostParseHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Whether a directive named `name` is registered.
    #[must_use]
    pub fn handles(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name() == name)
    }

    /// Replace every registered block with a placeholder comment.
    #[must_use]
    pub fn process(&mut self, input: &str) -> String {
        let lines: Vec<&str> = input.lines().collect();
        let mut output: Vec<String> = Vec::with_capacity(lines.len());
        let mut fence = FenceTracker::new();
        let mut idx = 0;

        while idx < lines.len() {
            let line = lines[idx];
            fence.update(line);

            if !fence.in_fence()
                && let Some(ContainerLine::Start {
                    name,
                    args,
                    colon_count,
                }) = parse_container_line(line)
                && self.handles(&name)
            {
                let (body_end, closed) = find_block_end(&lines, idx + 1, colon_count);
                let last = if closed { body_end } else { body_end - 1 };
                let block = DirectiveBlock {
                    name,
                    args,
                    body: lines[idx + 1..body_end].join("\n"),
                    text: lines[idx..=last.max(idx)].join("\n"),
                };
                if !closed {
                    self.warnings.push(format!(
                        "line {}: unclosed directive :::{} (missing closing :::)",
                        idx + 1,
                        block.name
                    ));
                }

                output.push(self.dispatch(&block, idx + 1));
                idx = if closed { body_end + 1 } else { body_end };
                continue;
            }

            output.push(line.to_owned());
            idx += 1;
        }

        let mut result = output.join("\n");
        if input.ends_with('\n') {
            result.push('\n');
        }
        result
    }

    /// Run a block's directive and return its placeholder line.
    fn dispatch(&mut self, block: &DirectiveBlock, line: usize) -> String {
        let Some(directive) = self.directives.iter_mut().find(|d| d.name() == block.name) else {
            return block.text.clone();
        };

        let nodes = match DirectiveOptions::parse(&block.args.attrs, directive.option_keys()) {
            Ok(options) => {
                let ctx = self.config.create_context(line);
                directive.run(block, &options, &ctx)
            }
            Err(err) => {
                let ctx = self.config.create_context(line);
                tracing::warn!(
                    directive = %block.name,
                    path = %ctx.page_name(),
                    line,
                    error = %err,
                    "Invalid directive options"
                );
                self.warnings.push(format!("{}: {}: {err}", ctx.location(), block.name));
                vec![Node::Error {
                    message: format!("Invalid options for {} directive:", block.name),
                    detail: err.to_string(),
                    literal: Some(block.text.clone()),
                }]
            }
        };

        let id = self.blocks.len();
        self.blocks.push(nodes);
        format!("{PLACEHOLDER_PREFIX}{id}{PLACEHOLDER_SUFFIX}")
    }

    /// Run post-parse hooks, then replace placeholders with rendered nodes.
    pub fn post_process(&mut self, html: &mut String) {
        let page = self.config.page();
        for hook in &mut self.hooks {
            hook.resolve(&mut self.blocks, &page);
        }

        if self.blocks.is_empty() {
            return;
        }

        let mut out = String::with_capacity(html.len());
        let mut rest = html.as_str();
        while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
            out.push_str(&rest[..start]);
            let after = &rest[start + PLACEHOLDER_PREFIX.len()..];
            let Some(end) = after.find(PLACEHOLDER_SUFFIX) else {
                rest = &rest[start..];
                break;
            };

            let nodes = after[..end]
                .parse::<usize>()
                .ok()
                .and_then(|id| self.blocks.get(id));
            match nodes {
                Some(nodes) => out.push_str(&render_nodes(nodes)),
                None => {
                    let len = PLACEHOLDER_PREFIX.len() + end + PLACEHOLDER_SUFFIX.len();
                    out.push_str(&rest[start..start + len]);
                }
            }
            rest = &after[end + PLACEHOLDER_SUFFIX.len()..];
        }
        out.push_str(rest);
        *html = out;
    }

    /// Nodes emitted for each processed block, in page order.
    #[must_use]
    pub fn blocks(&self) -> &[Vec<Node>] {
        &self.blocks
    }

    /// Warnings from the processor, its directives and its hooks.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut all_warnings = self.warnings.clone();
        for directive in &self.directives {
            all_warnings.extend(directive.warnings().iter().cloned());
        }
        for hook in &self.hooks {
            all_warnings.extend(hook.warnings().iter().cloned());
        }
        all_warnings
    }
}

/// Find the closing line of a block whose body starts at `from`.
///
/// Returns the index of the closing `:::` and `true`, or `lines.len()` and
/// `false` if the block is never closed. Nested openings and fenced code
/// inside the body are skipped.
fn find_block_end(lines: &[&str], from: usize, colon_count: usize) -> (usize, bool) {
    let mut fence = FenceTracker::new();
    let mut nested = 0usize;

    for (offset, line) in lines[from..].iter().enumerate() {
        if fence.update(line) || fence.in_fence() {
            continue;
        }
        match parse_container_line(line) {
            Some(ContainerLine::Start { .. }) => nested += 1,
            Some(ContainerLine::End { colon_count: n }) => {
                if nested > 0 {
                    nested -= 1;
                } else if n >= colon_count {
                    return (from + offset, true);
                }
            }
            None => {}
        }
    }

    (lines.len(), false)
}
