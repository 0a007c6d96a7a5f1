use std::collections::HashMap;

use crate::model::{MediaKind, RenameRecord};
use crate::naming::normalize_title;

/// Cached disambiguation outcome for a `(title, kind)` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// Provider record id the user confirmed.
    Record(String),
    Skip,
}

/// Cached decision for an ambiguous link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChoice {
    /// Canonical stem to rewrite to.
    Target(String),
    Keep,
}

/// State for a single run: interactive choices and the renames performed so far.
///
/// One is created per command invocation and threaded through resolution and
/// link rewriting. Nothing outlives the run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub dry_run: bool,
    choices: HashMap<(String, MediaKind), Choice>,
    link_choices: HashMap<String, LinkChoice>,
    renames: Vec<RenameRecord>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn cached_choice(&self, title: &str, kind: MediaKind) -> Option<&Choice> {
        self.choices.get(&(normalize_title(title), kind))
    }

    pub fn remember_choice(&mut self, title: &str, kind: MediaKind, choice: Choice) {
        self.choices.insert((normalize_title(title), kind), choice);
    }

    pub fn cached_link(&self, target: &str) -> Option<&LinkChoice> {
        self.link_choices.get(&normalize_title(target))
    }

    pub fn remember_link(&mut self, target: &str, choice: LinkChoice) {
        self.link_choices.insert(normalize_title(target), choice);
    }

    /// Record a completed rename. No-op renames are dropped.
    pub fn record_rename(&mut self, record: RenameRecord) {
        if !record.is_noop() {
            self.renames.push(record);
        }
    }

    pub fn renames(&self) -> &[RenameRecord] {
        &self.renames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identity;

    #[test]
    fn test_choice_cache_is_case_insensitive_and_kind_scoped() {
        let mut ctx = RunContext::new();
        ctx.remember_choice("The Office", MediaKind::Tv, Choice::Record("2316".into()));

        assert_eq!(
            ctx.cached_choice("the  office", MediaKind::Tv),
            Some(&Choice::Record("2316".into()))
        );
        assert_eq!(ctx.cached_choice("The Office", MediaKind::Movie), None);
    }

    #[test]
    fn test_skip_is_cached() {
        let mut ctx = RunContext::new();
        ctx.remember_choice("Loot", MediaKind::Tv, Choice::Skip);
        assert_eq!(ctx.cached_choice("Loot", MediaKind::Tv), Some(&Choice::Skip));
    }

    #[test]
    fn test_link_cache() {
        let mut ctx = RunContext::new();
        ctx.remember_link("The Office", LinkChoice::Keep);
        assert_eq!(ctx.cached_link("THE OFFICE"), Some(&LinkChoice::Keep));
    }

    #[test]
    fn test_noop_renames_dropped() {
        let mut ctx = RunContext::new();
        let same = Identity::new("Heat", Some(1995), MediaKind::Movie);
        ctx.record_rename(RenameRecord::new(same.clone(), same.clone()));
        ctx.record_rename(RenameRecord::new(
            Identity::new("Heat", None, MediaKind::Movie),
            same,
        ));
        assert_eq!(ctx.renames().len(), 1);
    }
}
