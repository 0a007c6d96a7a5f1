use std::sync::LazyLock;

use regex::Regex;

static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());

static FENCED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[^\n]*\n.*?```|~~~[^\n]*\n.*?~~~").unwrap());

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]*`").unwrap());

/// One `[[target#anchor|alias]]` occurrence in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikilinkToken {
    /// Link target with surrounding whitespace trimmed.
    pub target: String,
    /// Heading anchor including the leading `#`.
    pub anchor: Option<String>,
    pub alias: Option<String>,
    /// `![[...]]` embed rather than a reference.
    pub embed: bool,
    /// Byte range of the whole token, `[[` through `]]`.
    pub span: (usize, usize),
    /// Byte offset of the replaceable target portion (right after `[[`).
    pub target_start: usize,
    /// Byte length of the target portion (up to `#`, `|`, or `]]`).
    pub target_len: usize,
}

/// A text edit: replace `remove_len` bytes at `offset` with `insert_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub offset: usize,
    pub remove_len: usize,
    pub insert_text: String,
}

/// Byte ranges inside fenced code blocks or inline code spans.
fn build_excluded_ranges(markdown: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    for m in FENCED_CODE_RE.find_iter(markdown) {
        ranges.push((m.start(), m.end()));
    }
    for m in INLINE_CODE_RE.find_iter(markdown) {
        if !is_excluded(m.start(), &ranges) {
            ranges.push((m.start(), m.end()));
        }
    }
    ranges
}

fn is_excluded(offset: usize, excluded: &[(usize, usize)]) -> bool {
    excluded
        .iter()
        .any(|&(start, end)| offset >= start && offset < end)
}

/// Every wikilink outside code, in document order.
pub fn extract_tokens(markdown: &str) -> Vec<WikilinkToken> {
    let excluded = build_excluded_ranges(markdown);
    let mut tokens = Vec::new();

    for cap in WIKILINK_RE.captures_iter(markdown) {
        let (Some(full), Some(inner)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if is_excluded(full.start(), &excluded) {
            continue;
        }

        let content = inner.as_str();
        let alias_at = content.find('|');
        let anchor_at = content.find('#').filter(|&a| alias_at.map_or(true, |p| a < p));
        let mut name_end = anchor_at.or(alias_at).unwrap_or(content.len());

        // `[[Target\|alias]]` inside a table row escapes the pipe.
        if alias_at == Some(name_end) && content[..name_end].ends_with('\\') {
            name_end -= 1;
        }

        let target = content[..name_end].trim();
        if target.is_empty() {
            continue;
        }

        let anchor = anchor_at.map(|a| {
            let end = alias_at.filter(|&p| p > a).unwrap_or(content.len());
            content[a..end].trim_end_matches('\\').to_string()
        });
        let alias = alias_at.map(|p| content[p + 1..].to_string());
        let embed = full.start() > 0 && markdown.as_bytes()[full.start() - 1] == b'!';

        tokens.push(WikilinkToken {
            target: target.to_string(),
            anchor,
            alias,
            embed,
            span: (full.start(), full.end()),
            target_start: inner.start(),
            target_len: name_end,
        });
    }

    tokens
}

/// Apply edits, highest offset first, so earlier offsets stay valid.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut out = text.to_string();
    for edit in sorted {
        out.replace_range(edit.offset..edit.offset + edit.remove_len, &edit.insert_text);
    }
    out
}

/// Render `[[target]]` or `[[target|alias]]`.
pub fn format_wikilink(target: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("[[{target}|{alias}]]"),
        None => format!("[[{target}]]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_simple_token() {
        let tokens = extract_tokens("See [[Inception]] tonight");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].target, "Inception");
        assert_eq!(tokens[0].alias, None);
        assert_eq!(tokens[0].span, (4, 17));
        assert_eq!(tokens[0].target_start, 6);
        assert_eq!(tokens[0].target_len, 9);
    }

    #[test]
    fn extracts_alias_and_anchor() {
        let tokens = extract_tokens("[[The Matrix#Plot|great movie]]");
        assert_eq!(tokens[0].target, "The Matrix");
        assert_eq!(tokens[0].anchor.as_deref(), Some("#Plot"));
        assert_eq!(tokens[0].alias.as_deref(), Some("great movie"));
        assert_eq!(tokens[0].target_len, 10);
    }

    #[test]
    fn hash_in_alias_is_not_an_anchor() {
        let tokens = extract_tokens("[[Se7en|Movie #7]]");
        assert_eq!(tokens[0].target, "Se7en");
        assert_eq!(tokens[0].anchor, None);
        assert_eq!(tokens[0].alias.as_deref(), Some("Movie #7"));
    }

    #[test]
    fn escaped_pipe_in_table() {
        let tokens = extract_tokens("| [[Heat\\|Heat (1995)]] | 5 |");
        assert_eq!(tokens[0].target, "Heat");
        assert_eq!(tokens[0].target_len, 4);
    }

    #[test]
    fn marks_embeds() {
        let tokens = extract_tokens("![[Inception (2010).jpg]]\n[[Inception (2010)]]");
        assert!(tokens[0].embed);
        assert!(!tokens[1].embed);
    }

    #[test]
    fn skips_code() {
        let text = "```\n[[Fenced]]\n```\n~~~md\n[[Tilde]]\n~~~\n`[[Inline]]` and [[Real]]";
        let targets: Vec<_> = extract_tokens(text).into_iter().map(|t| t.target).collect();
        assert_eq!(targets, vec!["Real"]);
    }

    #[test]
    fn ignores_empty_brackets() {
        assert!(extract_tokens("[[]] and [[  |alias]]").is_empty());
    }

    #[test]
    fn apply_edits_in_reverse_order() {
        let text = "[[A]] then [[B|b]]";
        let edits = vec![
            TextEdit {
                offset: 2,
                remove_len: 1,
                insert_text: "Alpha (2001)".into(),
            },
            TextEdit {
                offset: 13,
                remove_len: 1,
                insert_text: "Beta (2002)".into(),
            },
        ];
        assert_eq!(
            apply_edits(text, &edits),
            "[[Alpha (2001)]] then [[Beta (2002)|b]]"
        );
    }

    #[test]
    fn format() {
        assert_eq!(format_wikilink("Heat (1995)", None), "[[Heat (1995)]]");
        assert_eq!(format_wikilink("Heat", Some("h")), "[[Heat|h]]");
    }
}
