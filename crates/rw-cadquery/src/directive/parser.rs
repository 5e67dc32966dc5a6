//! Container line parsing: `:::name[argument]{attrs}` and `:::`.

use super::DirectiveArgs;

/// A line that opens or closes a container block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContainerLine {
    Start {
        name: String,
        args: DirectiveArgs,
        colon_count: usize,
    },
    End {
        colon_count: usize,
    },
}

/// Parse a whole line as a container opening or closing.
///
/// Returns `None` if the line is neither.
pub(crate) fn parse_container_line(line: &str) -> Option<ContainerLine> {
    let trimmed = line.trim();
    if !trimmed.starts_with(":::") {
        return None;
    }

    let colon_count = trimmed.chars().take_while(|&c| c == ':').count();
    let after_colons = trimmed[colon_count..].trim_start();

    if after_colons.is_empty() {
        return Some(ContainerLine::End { colon_count });
    }

    let name_end = after_colons
        .find(|c: char| c == '[' || c == '{' || c.is_whitespace())
        .unwrap_or(after_colons.len());
    let name = &after_colons[..name_end];
    if !is_valid_directive_name(name) {
        return None;
    }

    let after_name = &after_colons[name_end..];
    let (argument, consumed) = enclosed(after_name, '[', ']');
    let (attrs, _) = enclosed(&after_name[consumed..], '{', '}');

    Some(ContainerLine::Start {
        name: name.to_owned(),
        args: DirectiveArgs::parse(argument, attrs),
        colon_count,
    })
}

/// Names are alphanumeric plus `-`, `_` and `:` (for `domain:directive`),
/// and must not start or end with `:`.
fn is_valid_directive_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(':')
        && !name.ends_with(':')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ':')
}

/// Content between a leading `open` and its matching `close`.
///
/// Returns the content and the bytes consumed, or `("", 0)` if `s` does not
/// start with a balanced pair.
fn enclosed(s: &str, open: char, close: char) -> (&str, usize) {
    if !s.starts_with(open) {
        return ("", 0);
    }

    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return (&s[open.len_utf8()..i], i + close.len_utf8());
            }
        }
    }
    ("", 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn start(line: &str) -> (String, DirectiveArgs, usize) {
        match parse_container_line(line) {
            Some(ContainerLine::Start {
                name,
                args,
                colon_count,
            }) => (name, args, colon_count),
            other => panic!("expected container start, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_start() {
        let (name, args, colons) = start(":::cadquery-vtk");
        assert_eq!(name, "cadquery-vtk");
        assert_eq!(args, DirectiveArgs::default());
        assert_eq!(colons, 3);
    }

    #[test]
    fn test_domain_name() {
        let (name, _, _) = start("::: cadquery:svg{align=center}");
        assert_eq!(name, "cadquery:svg");
    }

    #[test]
    fn test_argument_and_attrs() {
        let (name, args, _) =
            start(r#":::cadquery-vtk[models/bracket.py]{height="300px" select=part}"#);
        assert_eq!(name, "cadquery-vtk");
        assert_eq!(args.argument, "models/bracket.py");
        assert_eq!(args.get("height"), Some("300px"));
        assert_eq!(args.get("select"), Some("part"));
    }

    #[test]
    fn test_attrs_with_space_after_name() {
        let (name, args, _) = start(":::cq_plot");
        assert_eq!(name, "cq_plot");
        assert!(args.attrs.is_empty());
    }

    #[test]
    fn test_four_colon_start() {
        let (_, _, colons) = start("::::cadquery:vtk");
        assert_eq!(colons, 4);
    }

    #[test]
    fn test_end() {
        assert_eq!(
            parse_container_line(":::"),
            Some(ContainerLine::End { colon_count: 3 })
        );
        assert_eq!(
            parse_container_line("  ::::  "),
            Some(ContainerLine::End { colon_count: 4 })
        );
    }

    #[test]
    fn test_not_container() {
        assert!(parse_container_line("regular text").is_none());
        assert!(parse_container_line("::leaf[x]").is_none());
        assert!(parse_container_line(":::bad@name").is_none());
        assert!(parse_container_line(":::cadquery:").is_none());
    }

    #[test]
    fn test_enclosed() {
        assert_eq!(enclosed("[a.py] rest", '[', ']'), ("a.py", 6));
        assert_eq!(enclosed("[nested [x]]", '[', ']'), ("nested [x]", 12));
        assert_eq!(enclosed("{unclosed", '{', '}'), ("", 0));
        assert_eq!(enclosed("none", '[', ']'), ("", 0));
    }
}
