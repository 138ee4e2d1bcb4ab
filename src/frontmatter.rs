//! Frontmatter extraction for markdown chapters.
//!
//! Chapters carry a leading `---` delimited metadata block with `title` and
//! `sidebar_position` fields. [`parse`] extracts both and returns the body
//! with the block stripped. Malformed blocks degrade to "no metadata
//! extracted" — this module has no error path.

/// Structured metadata pulled from a document's header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub order: Option<i64>,
}

/// Parse a raw document into `(metadata, body)`.
///
/// Recognizes a leading block delimited by `---` lines and extracts `title`
/// (quoted or bare) and `order`/`sidebar_position` (integer) from labeled
/// lines inside it. When no `title` field is present, the first `# ` heading
/// in the body is used instead. The body is returned with the block
/// stripped; without a block it is returned unchanged.
pub fn parse(raw: &str) -> (FrontMatter, &str) {
    let mut meta = FrontMatter::default();
    let body = strip_block(raw, &mut meta).unwrap_or(raw);

    if meta.title.is_none() {
        meta.title = first_heading(body);
    }

    (meta, body)
}

/// Strip a well-formed frontmatter block, filling `meta` from its fields.
///
/// Returns `None` (and leaves `meta` empty) when the input has no opening
/// delimiter or the block is never closed.
fn strip_block<'a>(raw: &'a str, meta: &mut FrontMatter) -> Option<&'a str> {
    let mut lines = raw.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" || !first.ends_with('\n') {
        return None;
    }

    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" {
            return Some(&raw[offset..]);
        }
        parse_field(trimmed, meta);
    }

    // Unclosed block: treat the whole input as body.
    *meta = FrontMatter::default();
    None
}

/// Parse one `key: value` line inside the block. Unknown keys are ignored.
fn parse_field(line: &str, meta: &mut FrontMatter) {
    let Some((key, value)) = line.split_once(':') else {
        return;
    };
    let value = value.trim();

    match key.trim() {
        "title" => {
            let title = value.trim_matches(|c| c == '"' || c == '\'');
            if !title.is_empty() {
                meta.title = Some(title.to_string());
            }
        }
        "order" | "sidebar_position" => {
            meta.order = value.parse::<i64>().ok();
        }
        _ => {}
    }
}

/// First line-leading `# ` heading in the body, used as a title fallback.
fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_title_and_body() {
        let (meta, body) = parse("---\ntitle: \"Intro\"\n---\nBody text");
        assert_eq!(meta.title.as_deref(), Some("Intro"));
        assert_eq!(body, "Body text");
    }

    #[test]
    fn test_bare_title() {
        let (meta, _) = parse("---\ntitle: Getting Started\n---\nBody");
        assert_eq!(meta.title.as_deref(), Some("Getting Started"));
    }

    #[test]
    fn test_sidebar_position() {
        let (meta, _) = parse("---\ntitle: Intro\nsidebar_position: 2\n---\nBody");
        assert_eq!(meta.order, Some(2));
    }

    #[test]
    fn test_order_label() {
        let (meta, _) = parse("---\norder: 7\n---\nBody");
        assert_eq!(meta.order, Some(7));
    }

    #[test]
    fn test_heading_fallback_without_block() {
        let (meta, body) = parse("# Setup Guide\n\nInstall ROS 2 first.");
        assert_eq!(meta.title.as_deref(), Some("Setup Guide"));
        assert_eq!(body, "# Setup Guide\n\nInstall ROS 2 first.");
    }

    #[test]
    fn test_heading_fallback_with_block_missing_title() {
        let (meta, body) = parse("---\nsidebar_position: 1\n---\n# Hardware\n\nText.");
        assert_eq!(meta.title.as_deref(), Some("Hardware"));
        assert_eq!(meta.order, Some(1));
        assert_eq!(body, "# Hardware\n\nText.");
    }

    #[test]
    fn test_unclosed_block_degrades_to_no_metadata() {
        let raw = "---\ntitle: Broken\nBody continues forever";
        let (meta, body) = parse(raw);
        assert_eq!(meta.title, None);
        assert_eq!(body, raw);
    }

    #[test]
    fn test_no_block_no_heading() {
        let (meta, body) = parse("Plain text only.");
        assert_eq!(meta, FrontMatter::default());
        assert_eq!(body, "Plain text only.");
    }

    #[test]
    fn test_empty_input() {
        let (meta, body) = parse("");
        assert_eq!(meta, FrontMatter::default());
        assert_eq!(body, "");
    }

    #[test]
    fn test_non_integer_order_ignored() {
        let (meta, _) = parse("---\nsidebar_position: first\n---\nBody");
        assert_eq!(meta.order, None);
    }
}
