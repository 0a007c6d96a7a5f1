//! Rewriting `[[wikilinks]]` so they point at canonical `"Title (Year)"` notes.
//!
//! Only the target portion of a link is replaced; anchors and aliases are kept
//! byte for byte. Index keys are base titles, which never end in a year, so a
//! link that already points at a canonical stem is never matched again.

use std::collections::BTreeMap;

use crate::context::{LinkChoice, RunContext};
use crate::model::RenameRecord;
use crate::naming::{is_canonical_stem, normalize_title, split_canonical_stem};
use crate::prompt::{PromptRequest, Prompter};
use crate::wikilink::{apply_edits, extract_tokens, TextEdit};

/// Base title (normalized) → canonical stems registered under it.
#[derive(Debug, Clone, Default)]
pub struct TargetIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl TargetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every canonical filename stem in the corpus under its base title.
    /// Unresolved stems are ignored.
    pub fn from_corpus<'a>(stems: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::new();
        for stem in stems {
            let Some((base, _)) = split_canonical_stem(stem) else {
                continue;
            };
            // "X (2019) (2020)": a key ending in a year would match rewritten links.
            if is_canonical_stem(base) {
                tracing::debug!(stem, "skipping canonical-looking base title");
                continue;
            }
            index.insert(base, stem);
        }
        index
    }

    /// Index the renames of a run: the old name, as written in links to it,
    /// maps to the new canonical stem.
    pub fn from_renames(renames: &[RenameRecord]) -> Self {
        let mut index = Self::new();
        for rename in renames.iter().filter(|r| !r.is_noop()) {
            index.insert(&rename.old_identity.raw_name(), &rename.new_identity.stem());
        }
        index
    }

    pub fn insert(&mut self, key: &str, stem: &str) {
        let slot = self.entries.entry(normalize_title(key)).or_default();
        if !slot.iter().any(|s| s == stem) {
            slot.push(stem.to_string());
            slot.sort();
        }
    }

    pub fn get(&self, target: &str) -> Option<&[String]> {
        self.entries.get(&normalize_title(target)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub text: String,
    /// Links whose target was replaced.
    pub updated: usize,
    /// Ambiguous links left unchanged.
    pub ambiguous_skipped: usize,
}

impl RewriteOutcome {
    pub fn changed(&self) -> bool {
        self.updated > 0
    }
}

/// Rewrite every link in `text` whose target matches an index key.
pub fn rewrite_document(
    text: &str,
    index: &TargetIndex,
    ctx: &mut RunContext,
    prompter: &mut dyn Prompter,
) -> RewriteOutcome {
    let mut edits = Vec::new();
    let mut ambiguous_skipped = 0;

    for token in extract_tokens(text) {
        if token.embed {
            continue;
        }
        let Some(candidates) = index.get(&token.target) else {
            continue;
        };

        let stem = match candidates {
            [] => continue,
            [only] => only.clone(),
            several => match choose_target(&token.target, several, ctx, prompter) {
                Some(stem) => stem,
                None => {
                    ambiguous_skipped += 1;
                    continue;
                }
            },
        };

        if token.target == stem {
            continue;
        }
        tracing::debug!(from = %token.target, to = %stem, "rewriting link");
        edits.push(TextEdit {
            offset: token.target_start,
            remove_len: token.target_len,
            insert_text: stem,
        });
    }

    RewriteOutcome {
        text: apply_edits(text, &edits),
        updated: edits.len(),
        ambiguous_skipped,
    }
}

/// Pick one of several identities sharing a base title. `None` keeps the link.
fn choose_target(
    target: &str,
    candidates: &[String],
    ctx: &mut RunContext,
    prompter: &mut dyn Prompter,
) -> Option<String> {
    match ctx.cached_link(target) {
        Some(LinkChoice::Target(stem)) => return Some(stem.clone()),
        Some(LinkChoice::Keep) => return None,
        None => {}
    }

    if !prompter.is_interactive() {
        tracing::debug!(target, count = candidates.len(), "ambiguous link left unchanged");
        return None;
    }

    let request = PromptRequest::new(
        format!("Multiple notes match [[{target}]]"),
        candidates.to_vec(),
        "Keep original",
    );
    let choice = match prompter.choose(&request) {
        Some(n) if n < candidates.len() => LinkChoice::Target(candidates[n].clone()),
        _ => LinkChoice::Keep,
    };
    ctx.remember_link(target, choice.clone());

    match choice {
        LinkChoice::Target(stem) => Some(stem),
        LinkChoice::Keep => None,
    }
}
