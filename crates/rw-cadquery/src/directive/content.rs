//! Nested markdown parsing of figure bodies into top-level blocks.

use pulldown_cmark::{Event, Options, Parser, Tag, html};

/// A top-level block of a figure body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContentBlock {
    /// Paragraph, holding its inline HTML.
    Paragraph(String),
    /// HTML comment, used as an empty caption placeholder.
    Comment,
    /// Fenced or indented code block; `line` is 0-indexed within the body.
    Code { text: String, line: usize },
    /// Anything else, rendered to HTML.
    Other(String),
}

/// Split `markdown` into its top-level blocks.
pub(crate) fn parse_blocks(markdown: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<Event<'_>> = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    for (event, range) in parser.into_offset_iter() {
        let opens = matches!(event, Event::Start(_));
        let closes = matches!(event, Event::End(_));

        if depth == 0 {
            start = range.start;
        }
        if opens {
            depth += 1;
        } else if closes {
            depth = depth.saturating_sub(1);
        }
        current.push(event);

        if depth == 0 {
            let line = markdown[..start].matches('\n').count();
            blocks.push(classify(std::mem::take(&mut current), line));
        }
    }

    blocks
}

fn classify(events: Vec<Event<'_>>, line: usize) -> ContentBlock {
    match events.first() {
        Some(Event::Start(Tag::Paragraph)) => {
            let inner = &events[1..events.len().saturating_sub(1)];
            let mut out = String::new();
            html::push_html(&mut out, inner.iter().cloned());
            ContentBlock::Paragraph(out)
        }
        Some(Event::Start(Tag::CodeBlock(_))) => {
            let mut text: String = events
                .iter()
                .filter_map(|e| match e {
                    Event::Text(t) => Some(t.as_ref()),
                    _ => None,
                })
                .collect();
            if text.ends_with('\n') {
                text.pop();
            }
            ContentBlock::Code { text, line }
        }
        Some(Event::Start(Tag::HtmlBlock)) if is_comment(&events) => ContentBlock::Comment,
        _ => {
            let mut out = String::new();
            html::push_html(&mut out, events.into_iter());
            ContentBlock::Other(out)
        }
    }
}

fn is_comment(events: &[Event<'_>]) -> bool {
    let raw: String = events
        .iter()
        .filter_map(|e| match e {
            Event::Html(h) => Some(h.as_ref()),
            _ => None,
        })
        .collect();
    let raw = raw.trim();
    raw.starts_with("<!--") && raw.ends_with("-->")
}
