use serde::{Deserialize, Serialize};

use super::{Identity, MediaKind};

/// A candidate search result, normalized at the provider boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    pub title: String,
    pub year: Option<u16>,
    pub kind: MediaKind,
    #[serde(default)]
    pub synopsis: String,
    /// Credited artist for albums; the canonical name becomes "Artist - Album".
    #[serde(default)]
    pub artist: Option<String>,
    /// Provider-side qualifier shown in listings (edition, release type, ...).
    #[serde(default)]
    pub qualifier: Option<String>,
}

impl ProviderRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, year: Option<u16>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year,
            kind,
            synopsis: String::new(),
            artist: None,
            qualifier: None,
        }
    }

    pub fn with_synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = synopsis.into();
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Name the note is filed under. Albums are prefixed with their artist.
    pub fn display_title(&self) -> String {
        match (&self.kind, &self.artist) {
            (MediaKind::Album, Some(artist)) => format!("{artist} - {}", self.title),
            _ => self.title.clone(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.display_title(), self.year, self.kind)
    }

    /// One-line listing used by interactive disambiguation.
    pub fn listing(&self) -> String {
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let mut line = format!("{} ({year}) [{}]", self.display_title(), self.kind.label());
        if let Some(ref q) = self.qualifier {
            if !q.is_empty() {
                line.push_str(&format!(" [{q}]"));
            }
        }
        line
    }

    /// Synopsis truncated to `max_chars` characters for listings.
    pub fn short_synopsis(&self, max_chars: usize) -> String {
        if self.synopsis.is_empty() {
            return "No description available".to_string();
        }
        if self.synopsis.chars().count() <= max_chars {
            return self.synopsis.clone();
        }
        let truncated: String = self.synopsis.chars().take(max_chars).collect();
        format!("{}...", truncated.trim_end())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRole {
    Director,
    Creator,
    Cast,
    Developer,
    Publisher,
    Artist,
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub role: CreditRole,
    pub name: String,
    /// Character played, for cast credits.
    #[serde(default)]
    pub character: Option<String>,
}

impl Credit {
    pub fn new(role: CreditRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            character: None,
        }
    }

    pub fn cast(name: impl Into<String>, character: impl Into<String>) -> Self {
        Self {
            role: CreditRole::Cast,
            name: name.into(),
            character: Some(character.into()),
        }
    }
}

/// Full provider record returned by a details lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub record: ProviderRecord,
    #[serde(default)]
    pub credits: Vec<Credit>,
    /// Canonical external page (IMDb, IGDB, MusicBrainz).
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    /// Provider genre names, translated to tags when the note is rendered.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Ready-made note tags beyond the kind tag: game modes, release types.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MediaDetails {
    pub fn new(record: ProviderRecord) -> Self {
        Self {
            record,
            credits: Vec::new(),
            external_url: None,
            poster_url: None,
            genres: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.record.identity()
    }

    /// First credited name for a role.
    pub fn first(&self, role: CreditRole) -> Option<&Credit> {
        self.credits.iter().find(|c| c.role == role)
    }

    pub fn cast(&self) -> impl Iterator<Item = &Credit> {
        self.credits.iter().filter(|c| c.role == CreditRole::Cast)
    }
}
