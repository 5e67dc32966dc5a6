//! Output nodes emitted by directives and their HTML rendering.
//!
//! Directives build a small tree of [`Node`]s instead of HTML strings so the
//! deferred SVG pass can find and rewrite image URIs before the page is
//! serialized.

use std::fmt::Write;

use crate::domain::SvgPlaceholder;
use crate::options::Align;

/// Image source, either final or waiting for the deferred export pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageUri {
    Resolved(String),
    Pending(SvgPlaceholder),
}

/// Document node produced by a directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `<figure>` with optional alignment, extra classes, width and id.
    Figure {
        id: Option<String>,
        align: Option<Align>,
        classes: Vec<String>,
        width: Option<String>,
        children: Vec<Node>,
    },
    /// Caption holding already-rendered inline HTML.
    Caption(String),
    Image {
        uri: ImageUri,
        alt: String,
    },
    /// `<div>` with classes and optional inline style.
    Container {
        classes: Vec<String>,
        style: Option<String>,
        children: Vec<Node>,
    },
    /// Trusted HTML emitted as-is.
    Raw(String),
    /// Preformatted source listing.
    LiteralBlock {
        language: Option<String>,
        text: String,
    },
    /// Visible failure report; `literal` quotes the offending block.
    Error {
        message: String,
        detail: String,
        literal: Option<String>,
    },
}

impl Node {
    #[must_use]
    pub fn container(classes: &[&str], children: Vec<Node>) -> Self {
        Self::Container {
            classes: classes.iter().map(|&c| c.to_owned()).collect(),
            style: None,
            children,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            detail: detail.into(),
            literal: None,
        }
    }

    /// Python source listing.
    #[must_use]
    pub fn source_listing(text: &str) -> Self {
        Self::LiteralBlock {
            language: Some("python".to_owned()),
            text: text.to_owned(),
        }
    }

    /// Visit this node and all descendants mutably, parents first.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Node)) {
        visit(self);
        if let Self::Figure { children, .. } | Self::Container { children, .. } = self {
            for child in children {
                child.walk_mut(visit);
            }
        }
    }

    /// Append this node's HTML to `out`.
    pub fn render(&self, out: &mut String) {
        match self {
            Self::Figure {
                id,
                align,
                classes,
                width,
                children,
            } => {
                out.push_str("<figure");
                if let Some(id) = id {
                    let _ = write!(out, r#" id="{}""#, escape_html(id));
                }
                let mut all_classes: Vec<String> = Vec::with_capacity(classes.len() + 1);
                if let Some(align) = align {
                    all_classes.push(format!("align-{align}"));
                }
                all_classes.extend(classes.iter().cloned());
                write_class_attr(out, &all_classes);
                if let Some(width) = width {
                    let _ = write!(out, r#" style="width: {}""#, escape_html(width));
                }
                out.push('>');
                render_all(children, out);
                out.push_str("</figure>");
            }
            Self::Caption(html) => {
                let _ = write!(out, "<figcaption>{html}</figcaption>");
            }
            Self::Image { uri, alt } => {
                let src = match uri {
                    ImageUri::Resolved(src) => src.as_str(),
                    ImageUri::Pending(_) => "",
                };
                let _ = write!(
                    out,
                    r#"<img src="{}" alt="{}">"#,
                    escape_html(src),
                    escape_html(alt)
                );
            }
            Self::Container {
                classes,
                style,
                children,
            } => {
                out.push_str("<div");
                write_class_attr(out, classes);
                if let Some(style) = style {
                    let _ = write!(out, r#" style="{}""#, escape_html(style));
                }
                out.push('>');
                render_all(children, out);
                out.push_str("</div>");
            }
            Self::Raw(html) => out.push_str(html),
            Self::LiteralBlock { language, text } => match language {
                Some(lang) => {
                    let _ = write!(
                        out,
                        r#"<pre><code class="language-{}">{}</code></pre>"#,
                        escape_html(lang),
                        escape_html(text)
                    );
                }
                None => {
                    let _ = write!(out, "<pre><code>{}</code></pre>", escape_html(text));
                }
            },
            Self::Error {
                message,
                detail,
                literal,
            } => {
                let _ = write!(
                    out,
                    r#"<div class="cadquery-error" role="alert"><p><strong>{}</strong>"#,
                    escape_html(message)
                );
                if !detail.is_empty() {
                    let _ = write!(out, " <span>{}</span>", escape_html(detail));
                }
                out.push_str("</p>");
                if let Some(literal) = literal {
                    let _ = write!(out, "<pre>{}</pre>", escape_html(literal));
                }
                out.push_str("</div>");
            }
        }
    }
}

/// Render a node list to HTML.
#[must_use]
pub fn render_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    render_all(nodes, &mut out);
    out
}

fn render_all(nodes: &[Node], out: &mut String) {
    for node in nodes {
        node.render(out);
    }
}

fn write_class_attr(out: &mut String, classes: &[String]) {
    if !classes.is_empty() {
        let _ = write!(out, r#" class="{}""#, escape_html(&classes.join(" ")));
    }
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
