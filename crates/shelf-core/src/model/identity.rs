use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::naming;

/// The canonical (title, year, kind) triple a note is considered to represent.
///
/// Equality ignores `kind` and compares the title case-insensitively with
/// whitespace collapsed, so `"The  matrix"` and `"The Matrix"` are the same identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub title: String,
    pub year: Option<u16>,
    pub kind: MediaKind,
}

impl Identity {
    pub fn new(title: impl Into<String>, year: Option<u16>, kind: MediaKind) -> Self {
        Self {
            title: title.into(),
            year,
            kind,
        }
    }

    /// Lookup key used for base-title matching.
    pub fn key(&self) -> String {
        naming::normalize_title(&self.title)
    }

    /// Filename stem without extension: `"Title (Year)"`, or the sanitized title
    /// alone when the year is unknown.
    pub fn stem(&self) -> String {
        naming::canonical_stem(&self.title, self.year)
    }

    /// Full canonical filename with the given extension (without the dot).
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.stem(), extension)
    }

    /// The name as it appears in an existing filename or link, unsanitized.
    pub fn raw_name(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.year == other.year && self.key() == other.key()
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
        self.year.hash(state);
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({year})", self.title),
            None => write!(f, "{}", self.title),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Tv,
    Game,
    Album,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [Self::Movie, Self::Tv, Self::Game, Self::Album];

    /// Frontmatter tag that marks a note of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "series",
            Self::Game => "game",
            Self::Album => "album",
        }
    }

    /// Map a frontmatter tag or hashtag (without `#`) back to a kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().trim_start_matches('#').to_lowercase().as_str() {
            "movie" => Some(Self::Movie),
            "series" | "tv" => Some(Self::Tv),
            "game" => Some(Self::Game),
            "album" => Some(Self::Album),
            _ => None,
        }
    }

    /// Short uppercase label for disambiguation listings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Movie => "MOVIE",
            Self::Tv => "TV",
            Self::Game => "GAME",
            Self::Album => "ALBUM",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Tv => write!(f, "tv"),
            Self::Game => write!(f, "game"),
            Self::Album => write!(f, "album"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" | "series" => Ok(Self::Tv),
            "game" => Ok(Self::Game),
            "album" => Ok(Self::Album),
            _ => Err(format!("unknown media kind: {s}")),
        }
    }
}

/// One successful identity change, recorded so inbound links can be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    pub old_identity: Identity,
    pub new_identity: Identity,
}

impl RenameRecord {
    pub fn new(old_identity: Identity, new_identity: Identity) -> Self {
        Self {
            old_identity,
            new_identity,
        }
    }

    /// The file keeps its name, so nothing links differently.
    pub fn is_noop(&self) -> bool {
        self.old_identity.raw_name() == self.new_identity.stem()
    }
}
