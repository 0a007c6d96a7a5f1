//! Command flows: add new notes, resolve unresolved notes, rewrite corpus
//! links and fetch posters.
//!
//! Every flow processes one document at a time. Errors that only concern one
//! document are logged and counted; configuration errors end the run.

use std::path::Path;

use crate::config::ShelfConfig;
use crate::context::RunContext;
use crate::disambiguate::{resolve, Resolution};
use crate::error::{Result, ShelfError};
use crate::model::{Identity, MediaDetails, RenameRecord};
use crate::naming::parse_free_text;
use crate::note;
use crate::poster::{self, PosterFetcher};
use crate::prompt::Prompter;
use crate::provider::MetadataProvider;
use crate::rewrite::{rewrite_document, TargetIndex};
use crate::vault::{Document, Vault};

/// Counts reported at the end of a command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Notes or titles considered.
    pub examined: usize,
    /// Notes created, renamed or given a poster.
    pub changed: usize,
    /// No results, declined choices, occupied destinations.
    pub skipped: usize,
    pub failed: usize,
    /// Links rewritten across the corpus.
    pub links_updated: usize,
    /// Notes whose text changed because of link rewriting.
    pub notes_relinked: usize,
    /// Ambiguous links left unchanged.
    pub ambiguous_links: usize,
}

impl RunSummary {
    /// Add another command's counts to this one.
    pub fn merge(&mut self, other: &RunSummary) {
        self.examined += other.examined;
        self.changed += other.changed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.absorb_links(other);
    }

    fn absorb_links(&mut self, other: &RunSummary) {
        self.links_updated += other.links_updated;
        self.notes_relinked += other.notes_relinked;
        self.ambiguous_links += other.ambiguous_links;
    }

    /// Count a per-document error. Errors that end the run are returned.
    fn record_error(&mut self, path: &str, err: ShelfError) -> Result<()> {
        if !err.skips_document() {
            return Err(err);
        }
        if err.is_skip() || matches!(err, ShelfError::DestinationExists(_)) {
            tracing::info!(path, "skipped: {err}");
            self.skipped += 1;
        } else {
            tracing::warn!(path, "failed: {err}");
            self.failed += 1;
        }
        Ok(())
    }
}

/// One provider working over one vault.
pub struct Pipeline<'a, P: MetadataProvider> {
    provider: &'a P,
    vault: &'a Vault,
    config: &'a ShelfConfig,
}

impl<'a, P: MetadataProvider> Pipeline<'a, P> {
    pub fn new(provider: &'a P, vault: &'a Vault, config: &'a ShelfConfig) -> Self {
        Self {
            provider,
            vault,
            config,
        }
    }

    /// Search, disambiguate and fetch the full record for a title.
    pub async fn lookup(
        &self,
        title: &str,
        year: Option<u16>,
        ctx: &mut RunContext,
        prompter: &mut dyn Prompter,
    ) -> Result<MediaDetails> {
        let candidates = self.provider.search(title).await?;
        tracing::debug!(
            title,
            provider = self.provider.name(),
            count = candidates.len(),
            "search results"
        );
        match resolve(title, year, self.provider.kind(), &candidates, ctx, prompter) {
            Resolution::Selected(record) => self.provider.details(&record.id).await,
            Resolution::Skipped => Err(ShelfError::Ambiguous(format!("'{title}' skipped"))),
            Resolution::NoResults => Err(ShelfError::NotFound(format!(
                "no {} results for '{title}'",
                self.provider.name()
            ))),
        }
    }

    /// Create a note at the vault root for each free-text title.
    pub async fn add_titles(
        &self,
        titles: &[String],
        ctx: &mut RunContext,
        prompter: &mut dyn Prompter,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for input in titles {
            summary.examined += 1;
            match self.add_one(input, ctx, prompter).await {
                Ok(true) => summary.changed += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => summary.record_error(input, e)?,
            }
        }
        Ok(summary)
    }

    async fn add_one(
        &self,
        input: &str,
        ctx: &mut RunContext,
        prompter: &mut dyn Prompter,
    ) -> Result<bool> {
        let (title, year) = parse_free_text(input);
        let details = self.lookup(&title, year, ctx, prompter).await?;
        let file_name = details.identity().file_name(self.vault.extension());
        let path = self.vault.root().join(&file_name);

        if path.exists() && !prompter.confirm(&format!("{file_name} already exists. Overwrite?")) {
            tracing::info!(path = %path.display(), "kept existing note");
            return Ok(false);
        }
        if ctx.dry_run {
            tracing::info!(path = %path.display(), "dry run: would create note");
            return Ok(true);
        }
        self.vault.write(&path, &note::render_note(&details, self.config))?;
        Ok(true)
    }

    /// Notes of this provider's kind whose filename has no `(YYYY)` yet.
    pub fn unresolved_documents(&self) -> Result<Vec<Document>> {
        let kind = self.provider.kind();
        Ok(self
            .vault
            .documents()?
            .into_iter()
            .filter(|d| d.kind() == Some(kind))
            .filter(|d| !d.parsed_name().canonical)
            .filter(|d| !self.vault.is_skipped(&d.path))
            .collect())
    }

    /// Rename every unresolved note to its canonical name, then rewrite links
    /// that pointed at the old names.
    pub async fn resolve_documents(
        &self,
        ctx: &mut RunContext,
        prompter: &mut dyn Prompter,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for doc in self.unresolved_documents()? {
            summary.examined += 1;
            let shown = self.vault.relative(&doc.path).display().to_string();
            match self.resolve_one(&doc, ctx, prompter).await {
                Ok(()) => summary.changed += 1,
                Err(e) => summary.record_error(&shown, e)?,
            }
        }

        if !ctx.renames().is_empty() {
            let links = replay_renames(self.vault, ctx, prompter)?;
            summary.absorb_links(&links);
        }
        Ok(summary)
    }

    async fn resolve_one(
        &self,
        doc: &Document,
        ctx: &mut RunContext,
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        let parsed = doc.parsed_name();
        let kind = self.provider.kind();
        let details = self.lookup(&parsed.title, parsed.year, ctx, prompter).await?;

        let old_identity = Identity::new(parsed.title, parsed.year, kind);
        let new_identity = details.identity();
        let file_name = new_identity.file_name(self.vault.extension());

        if ctx.dry_run {
            tracing::info!(from = %doc.file_name(), to = %file_name, "dry run: would rename");
            ctx.record_rename(RenameRecord::new(old_identity, new_identity));
            return Ok(());
        }

        let new_path = match self.vault.rename(&doc.path, &file_name, false) {
            Ok(path) => path,
            Err(ShelfError::DestinationExists(dest)) => {
                let question = format!("{} already exists. Overwrite?", dest.display());
                if !prompter.confirm(&question) {
                    return Err(ShelfError::DestinationExists(dest));
                }
                self.vault.rename(&doc.path, &file_name, true)?
            }
            Err(e) => return Err(e),
        };
        // The file has moved: inbound links must follow even if the writes below fail.
        ctx.record_rename(RenameRecord::new(old_identity, new_identity));

        let mut text = note::append_sections(&doc.text, &details).unwrap_or_else(|| doc.text.clone());
        if let Some(updated) = self.move_poster(&doc.path, &new_path, &text) {
            text = updated;
        }
        if text != doc.text {
            self.vault.write(&new_path, &text)?;
        }
        Ok(())
    }

    /// Move `"<old stem>.jpg"` along with its note and repoint the note's own
    /// references to it. Returns the updated text when it changed.
    fn move_poster(&self, old_note: &Path, new_note: &Path, text: &str) -> Option<String> {
        let old_poster = poster::poster_path(old_note);
        if !old_poster.is_file() {
            return None;
        }
        let new_name = poster::poster_file_name(new_note);
        if let Err(e) = self.vault.rename(&old_poster, &new_name, false) {
            tracing::warn!(path = %old_poster.display(), "poster not moved: {e}");
            return None;
        }

        let old_link = format!("[[{}]]", poster::poster_file_name(old_note));
        let new_link = format!("[[{new_name}]]");
        text.contains(&old_link)
            .then(|| text.replace(&old_link, &new_link))
    }

    /// Download posters for notes of this provider's kind that lack one.
    pub async fn fetch_posters(
        &self,
        fetcher: &PosterFetcher,
        ctx: &mut RunContext,
        prompter: &mut dyn Prompter,
    ) -> Result<RunSummary> {
        let kind = self.provider.kind();
        let refresh = fetcher.config().refresh;
        let docs: Vec<Document> = self
            .vault
            .documents()?
            .into_iter()
            .filter(|d| d.kind() == Some(kind))
            .filter(|d| !self.vault.is_skipped(&d.path))
            .filter(|d| poster::needs_poster(&d.text, refresh))
            .collect();

        let mut summary = RunSummary::default();
        for doc in docs {
            summary.examined += 1;
            let shown = self.vault.relative(&doc.path).display().to_string();
            match self.poster_one(&doc, fetcher, ctx, prompter).await {
                Ok(()) => summary.changed += 1,
                Err(e) => summary.record_error(&shown, e)?,
            }
        }
        Ok(summary)
    }

    async fn poster_one(
        &self,
        doc: &Document,
        fetcher: &PosterFetcher,
        ctx: &mut RunContext,
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        let parsed = doc.parsed_name();
        let details = self.lookup(&parsed.title, parsed.year, ctx, prompter).await?;
        let url = details
            .poster_url
            .ok_or_else(|| ShelfError::NotFound(format!("no poster for '{}'", parsed.title)))?;

        let file_name = poster::poster_file_name(&doc.path);
        if ctx.dry_run {
            tracing::info!(path = %doc.path.display(), url, "dry run: would download poster");
            return Ok(());
        }

        fetcher.fetch(&url, &poster::poster_path(&doc.path)).await?;
        let text = poster::attach_poster(&doc.text, &file_name, fetcher.config().embed)?;
        self.vault.write(&doc.path, &text)
    }
}

/// Rewrite links that use an old name from this run's renames.
pub fn replay_renames(
    vault: &Vault,
    ctx: &mut RunContext,
    prompter: &mut dyn Prompter,
) -> Result<RunSummary> {
    let index = TargetIndex::from_renames(ctx.renames());
    if index.is_empty() {
        return Ok(RunSummary::default());
    }
    rewrite_docs(vault, vault.documents()?, &index, ctx, prompter)
}

/// Rewrite links to bare titles so they point at canonical notes.
pub fn fix_links(vault: &Vault, ctx: &mut RunContext, prompter: &mut dyn Prompter) -> Result<RunSummary> {
    let docs = vault.documents()?;
    let stems: Vec<String> = docs.iter().map(Document::stem).collect();
    let index = TargetIndex::from_corpus(stems.iter().map(String::as_str));
    tracing::debug!(keys = index.len(), "built link index");
    rewrite_docs(vault, docs, &index, ctx, prompter)
}

fn rewrite_docs(
    vault: &Vault,
    docs: Vec<Document>,
    index: &TargetIndex,
    ctx: &mut RunContext,
    prompter: &mut dyn Prompter,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for doc in docs {
        summary.examined += 1;
        let outcome = rewrite_document(&doc.text, index, ctx, prompter);
        summary.ambiguous_links += outcome.ambiguous_skipped;
        if !outcome.changed() {
            continue;
        }
        summary.links_updated += outcome.updated;
        summary.notes_relinked += 1;
        if ctx.dry_run {
            tracing::info!(path = %doc.path.display(), links = outcome.updated, "dry run: would rewrite links");
            continue;
        }
        if let Err(e) = vault.write(&doc.path, &outcome.text) {
            summary.record_error(&doc.path.display().to_string(), e)?;
        }
    }
    Ok(summary)
}
