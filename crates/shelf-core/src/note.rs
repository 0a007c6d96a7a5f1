//! Note bodies built from provider details: frontmatter tags plus the
//! `## Links` / `## Description` sections.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ShelfConfig;
use crate::model::{Credit, CreditRole, MediaDetails, MediaKind};
use crate::wikilink::format_wikilink;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_]+").unwrap());
static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+(Links|Description)\s*$").unwrap());

const UNKNOWN: &str = "Unknown";

/// Note tag for a provider genre: the configured mapping wins, otherwise a slug.
pub fn translate_genre_tag(genre: &str, config: &ShelfConfig) -> String {
    if let Some(tag) = config.genre_tag(genre) {
        return tag.to_string();
    }
    slugify(genre)
}

/// `"Science Fiction"` → `"science-fiction"`, `"Role-playing (RPG)"` → `"role-playing-rpg"`.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_SLUG_RE.replace_all(&lower, "");
    let dashed = SEPARATOR_RE.replace_all(stripped.trim(), "-");
    let collapsed = DASHES_RE.replace_all(&dashed, "-");
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

/// Kind tag, then provider tags, then translated genres, without duplicates.
pub fn note_tags(details: &MediaDetails, config: &ShelfConfig) -> Vec<String> {
    let mut tags = vec![details.record.kind.tag().to_string()];
    let extra = details
        .tags
        .iter()
        .cloned()
        .chain(details.genres.iter().map(|g| translate_genre_tag(g, config)));
    for tag in extra {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn linked_or_unknown(credit: Option<&Credit>) -> String {
    credit
        .map(|c| format_wikilink(&c.name, None))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `Michael Scott ([[Steve Carell]]), Dwight Schrute ([[Rainn Wilson]])`
fn cast_text(details: &MediaDetails) -> String {
    details
        .cast()
        .map(|c| {
            format!(
                "{} ({})",
                c.character.as_deref().unwrap_or(UNKNOWN),
                format_wikilink(&c.name, None)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prose description: synopsis followed by the credited people as wikilinks.
pub fn description(details: &MediaDetails) -> String {
    let synopsis = details.record.synopsis.trim();
    let people = match details.record.kind {
        MediaKind::Movie => format!(
            "Directed by {}. Starring {}.",
            linked_or_unknown(details.first(CreditRole::Director)),
            cast_text(details)
        ),
        MediaKind::Tv => format!(
            "Created by {}. Starring {}.",
            linked_or_unknown(details.first(CreditRole::Creator)),
            cast_text(details)
        ),
        MediaKind::Game => format!(
            "Developed by {}. Published by {}.",
            linked_or_unknown(details.first(CreditRole::Developer)),
            linked_or_unknown(details.first(CreditRole::Publisher))
        ),
        // Albums carry no synopsis.
        MediaKind::Album => {
            return format!(
                "By {}. Released by {}.",
                linked_or_unknown(details.first(CreditRole::Artist)),
                linked_or_unknown(details.first(CreditRole::Label))
            )
        }
    };
    if synopsis.is_empty() {
        people
    } else {
        format!("{synopsis} {people}")
    }
}

/// The `## Links` and `## Description` sections, with a leading blank line.
pub fn metadata_sections(details: &MediaDetails) -> String {
    let link = details.external_url.as_deref().unwrap_or("Not available");
    format!(
        "\n## Links\n{link}\n\n## Description\n{}\n",
        description(details)
    )
}

/// A complete new note: tags frontmatter followed by the metadata sections.
pub fn render_note(details: &MediaDetails, config: &ShelfConfig) -> String {
    let mut out = String::from("---\ntags:\n");
    for tag in note_tags(details, config) {
        out.push_str(&format!("  - {tag}\n"));
    }
    out.push_str("---\n");
    out.push_str(&metadata_sections(details));
    out
}

/// Body already has a `## Links` or `## Description` heading.
pub fn has_metadata_sections(text: &str) -> bool {
    SECTION_RE.is_match(text)
}

/// Append the metadata sections to an existing note unless it already has them.
/// Returns `None` when nothing needs to change.
pub fn append_sections(text: &str, details: &MediaDetails) -> Option<String> {
    if has_metadata_sections(text) {
        return None;
    }
    let mut out = text.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&metadata_sections(details));
    Some(out)
}
