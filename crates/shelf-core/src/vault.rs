//! The corpus: every note under a vault root.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::config::VaultConfig;
use crate::error::{Result, ShelfError};
use crate::frontmatter;
use crate::model::MediaKind;
use crate::naming::{parse_filename, ParsedName};

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)#(movie|series|tv|game|album)\b").unwrap());

/// A note and its full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn parsed_name(&self) -> ParsedName {
        parse_filename(&self.file_name())
    }

    pub fn kind(&self) -> Option<MediaKind> {
        detect_kind(&self.text)
    }
}

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    extension: String,
    exclude_dirs: Vec<String>,
    skip_patterns: Vec<String>,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>, config: &VaultConfig) -> Self {
        Self {
            root: root.into(),
            extension: config.extension.clone(),
            exclude_dirs: config.exclude_dirs.clone(),
            skip_patterns: config.skip_patterns.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Every note path under the root, sorted, skipping excluded directories.
    pub fn document_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(ShelfError::InvalidInput(format!(
                "vault root is not a directory: {}",
                self.root.display()
            )));
        }

        let mut paths = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("vault: skipping unreadable entry: {e}");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_note(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Every note with its text. Notes that are not valid UTF-8 are logged and skipped.
    pub fn documents(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for path in self.document_paths()? {
            match self.read(&path) {
                Ok(doc) => docs.push(doc),
                Err(e) => tracing::warn!(path = %path.display(), "vault: skipping note: {e}"),
            }
        }
        Ok(docs)
    }

    pub fn read(&self, path: &Path) -> Result<Document> {
        let text = fs::read_to_string(path)?;
        Ok(Document {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn write(&self, path: &Path, text: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        tracing::info!(path = %path.display(), "wrote note");
        Ok(())
    }

    /// Rename a file within its directory.
    ///
    /// Fails with [`ShelfError::DestinationExists`] when the target is occupied,
    /// unless `overwrite` is set.
    pub fn rename(&self, from: &Path, new_file_name: &str, overwrite: bool) -> Result<PathBuf> {
        let to = from
            .parent()
            .map(|p| p.join(new_file_name))
            .unwrap_or_else(|| PathBuf::from(new_file_name));

        if to == from {
            return Ok(to);
        }
        if !from.is_file() {
            return Err(ShelfError::NotFound(format!(
                "source '{}' does not exist or is not a file",
                from.display()
            )));
        }
        if !overwrite && to.exists() {
            return Err(ShelfError::DestinationExists(to));
        }

        fs::rename(from, &to)?;
        tracing::info!(from = %from.display(), to = %to.display(), "renamed");
        Ok(to)
    }

    /// Filename matches one of the configured skip patterns.
    pub fn is_skipped(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.skip_patterns
            .iter()
            .any(|p| !p.is_empty() && name.contains(&p.to_lowercase()))
    }

    /// Path shown in progress output.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn is_note(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.exclude_dirs.iter().any(|d| d == name.as_ref())
    }
}

/// Media kind of a note: the frontmatter `tags` first, then a body hashtag.
pub fn detect_kind(text: &str) -> Option<MediaKind> {
    let (fm, body) = frontmatter::parse(text);
    if let Some(kind) = fm
        .as_ref()
        .and_then(|fm| fm.tags().iter().find_map(|t| MediaKind::from_tag(t)))
    {
        return Some(kind);
    }
    HASHTAG_RE
        .captures(&body)
        .and_then(|caps| MediaKind::from_tag(&caps[1]))
}
