//! Picking one provider record for a title query.
//!
//! Automatic rules are applied in order: year filter, exact title, single
//! candidate. Only a genuinely ambiguous set reaches the [`Prompter`], and the
//! answer is cached in the [`RunContext`] for the rest of the run.

use crate::context::{Choice, RunContext};
use crate::model::{MediaKind, ProviderRecord};
use crate::prompt::{PromptRequest, Prompter};

const SYNOPSIS_CHARS: usize = 100;

/// Outcome of the automatic rules alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Index into the candidate slice.
    Selected(usize),
    NoResults,
    /// Indices of the candidates the user has to choose between.
    NeedsPrompt(Vec<usize>),
}

/// Final outcome for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Selected(ProviderRecord),
    /// The user skipped, or the query was ambiguous in batch mode.
    Skipped,
    NoResults,
}

/// Apply the automatic selection rules.
pub fn auto_select(title: &str, year: Option<u16>, candidates: &[ProviderRecord]) -> Selection {
    let mut pool: Vec<usize> = (0..candidates.len()).collect();

    if let Some(year) = year {
        let by_year: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&i| candidates[i].year == Some(year))
            .collect();
        match by_year.len() {
            1 => return Selection::Selected(by_year[0]),
            0 => tracing::debug!(title, year, "no candidate matches year, using all results"),
            _ => pool = by_year,
        }
    }

    let wanted = title.trim().to_lowercase();
    let exact: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&i| {
            let c = &candidates[i];
            c.title.trim().to_lowercase() == wanted
                || c.display_title().trim().to_lowercase() == wanted
        })
        .collect();
    if exact.len() == 1 {
        return Selection::Selected(exact[0]);
    }

    match pool.len() {
        0 => Selection::NoResults,
        1 => Selection::Selected(pool[0]),
        _ => Selection::NeedsPrompt(pool),
    }
}

/// Resolve a query to a record, prompting when the automatic rules cannot decide.
pub fn resolve(
    title: &str,
    year: Option<u16>,
    kind: MediaKind,
    candidates: &[ProviderRecord],
    ctx: &mut RunContext,
    prompter: &mut dyn Prompter,
) -> Resolution {
    match ctx.cached_choice(title, kind) {
        Some(Choice::Skip) => {
            tracing::debug!(title, "reusing cached skip");
            return Resolution::Skipped;
        }
        Some(Choice::Record(id)) => {
            if let Some(record) = candidates.iter().find(|c| &c.id == id) {
                tracing::debug!(title, id = %id, "reusing cached choice");
                return Resolution::Selected(record.clone());
            }
        }
        None => {}
    }

    let pool = match auto_select(title, year, candidates) {
        Selection::Selected(i) => return Resolution::Selected(candidates[i].clone()),
        Selection::NoResults => return Resolution::NoResults,
        Selection::NeedsPrompt(pool) => pool,
    };

    let request = PromptRequest::new(
        format!("Multiple results found for '{title}'"),
        pool.iter()
            .map(|&i| {
                let c = &candidates[i];
                format!("{}\n   {}", c.listing(), c.short_synopsis(SYNOPSIS_CHARS))
            })
            .collect(),
        "Skip this file",
    );

    match prompter.choose(&request) {
        Some(n) if n < pool.len() => {
            let record = candidates[pool[n]].clone();
            ctx.remember_choice(title, kind, Choice::Record(record.id.clone()));
            Resolution::Selected(record)
        }
        _ => {
            ctx.remember_choice(title, kind, Choice::Skip);
            Resolution::Skipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{NonInteractive, ScriptedPrompter};

    fn tv(id: &str, title: &str, year: u16) -> ProviderRecord {
        ProviderRecord::new(id, title, Some(year), MediaKind::Tv)
    }

    fn movie(id: &str, title: &str, year: Option<u16>) -> ProviderRecord {
        ProviderRecord::new(id, title, year, MediaKind::Movie)
    }

    #[test]
    fn test_single_year_match_selected() {
        let candidates = vec![
            movie("1", "Dune", Some(1984)),
            movie("2", "Dune", Some(2021)),
            movie("3", "Dune: Part Two", Some(2024)),
        ];
        assert_eq!(
            auto_select("Dune", Some(2021), &candidates),
            Selection::Selected(1)
        );
    }

    #[test]
    fn test_exact_title_after_year_filter() {
        let candidates = vec![tv("1", "Loot - Blood Treasure", 2022), tv("2", "Loot", 2022)];
        assert_eq!(
            auto_select("Loot", Some(2022), &candidates),
            Selection::Selected(1)
        );
    }

    #[test]
    fn test_exact_title_is_case_insensitive() {
        let candidates = vec![
            movie("1", "Heat", Some(1995)),
            movie("2", "The Heat", Some(2013)),
        ];
        assert_eq!(auto_select("  heat ", None, &candidates), Selection::Selected(0));
    }

    #[test]
    fn test_year_without_match_falls_back_to_all() {
        let candidates = vec![movie("1", "Heat", Some(1995)), movie("2", "Heat Wave", None)];
        assert_eq!(auto_select("Heat", Some(1980), &candidates), Selection::Selected(0));
    }

    #[test]
    fn test_single_candidate_selected() {
        let candidates = vec![movie("1", "Inception", Some(2010))];
        assert_eq!(
            auto_select("Inceptoin", None, &candidates),
            Selection::Selected(0)
        );
    }

    #[test]
    fn test_no_results() {
        assert_eq!(auto_select("Anything", Some(2000), &[]), Selection::NoResults);
    }

    #[test]
    fn test_prompt_required() {
        let candidates = vec![
            tv("1", "The Office", 2001),
            tv("2", "The Office", 2005),
            tv("3", "The Office Mixtape", 2022),
        ];
        assert_eq!(
            auto_select("The Office", None, &candidates),
            Selection::NeedsPrompt(vec![0, 1, 2])
        );

        // Two exact matches in the same year still need a prompt.
        let candidates = vec![movie("1", "Crash", Some(2004)), movie("2", "Crash", Some(2004))];
        assert_eq!(
            auto_select("Crash", Some(2004), &candidates),
            Selection::NeedsPrompt(vec![0, 1])
        );
    }

    #[test]
    fn test_resolve_prompts_and_caches_choice() {
        let candidates = vec![tv("2316", "The Office", 2005), tv("2996", "The Office", 2001)];
        let mut ctx = RunContext::new();
        let mut prompter = ScriptedPrompter::new([2]);

        let first = resolve("The Office", None, MediaKind::Tv, &candidates, &mut ctx, &mut prompter);
        assert_eq!(first, Resolution::Selected(candidates[1].clone()));

        let second = resolve("the office", None, MediaKind::Tv, &candidates, &mut ctx, &mut prompter);
        assert_eq!(second, Resolution::Selected(candidates[1].clone()));
        assert_eq!(prompter.asked.len(), 1, "second lookup must not prompt");

        let request = &prompter.asked[0];
        assert_eq!(request.options.len(), 2);
        assert!(request.options[0].starts_with("The Office (2005) [TV]"));
        assert_eq!(request.skip_label, "Skip this file");
    }

    #[test]
    fn test_resolve_skip_is_cached() {
        let candidates = vec![tv("1", "Loot", 2022), tv("2", "Loot", 2010)];
        let mut ctx = RunContext::new();
        let mut prompter = ScriptedPrompter::new([0, 1]);

        assert_eq!(
            resolve("Loot", None, MediaKind::Tv, &candidates, &mut ctx, &mut prompter),
            Resolution::Skipped
        );
        assert_eq!(
            resolve("Loot", None, MediaKind::Tv, &candidates, &mut ctx, &mut prompter),
            Resolution::Skipped
        );
        assert_eq!(prompter.asked.len(), 1);
    }

    #[test]
    fn test_resolve_non_interactive_skips_ambiguous() {
        let candidates = vec![tv("1", "The Office", 2001), tv("2", "The Office", 2005)];
        let mut ctx = RunContext::new();
        assert_eq!(
            resolve("The Office", None, MediaKind::Tv, &candidates, &mut ctx, &mut NonInteractive),
            Resolution::Skipped
        );
    }

    #[test]
    fn test_resolve_non_interactive_still_auto_selects() {
        let candidates = vec![tv("1", "Loot - Blood Treasure", 2022), tv("2", "Loot", 2022)];
        let mut ctx = RunContext::new();
        assert_eq!(
            resolve("Loot", Some(2022), MediaKind::Tv, &candidates, &mut ctx, &mut NonInteractive),
            Resolution::Selected(candidates[1].clone())
        );
    }

    #[test]
    fn test_resolve_no_results() {
        let mut ctx = RunContext::new();
        assert_eq!(
            resolve("Nothing", None, MediaKind::Game, &[], &mut ctx, &mut NonInteractive),
            Resolution::NoResults
        );
    }
}
