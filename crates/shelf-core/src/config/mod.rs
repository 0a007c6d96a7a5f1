use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelfConfig {
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub igdb: IgdbConfig,
    #[serde(default)]
    pub musicbrainz: MusicBrainzConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub posters: PosterConfig,
    /// Note tag → provider genre names that map to it.
    #[serde(default)]
    pub genres: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override the environment variable the key is read from.
    #[serde(default)]
    pub env_var: Option<String>,
    #[serde(default = "default_tmdb_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_url")]
    pub image_base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            env_var: None,
            base_url: default_tmdb_url(),
            image_base_url: default_tmdb_image_url(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgdbConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Pre-issued Twitch app token. When absent one is requested with the client secret.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_igdb_url")]
    pub base_url: String,
    #[serde(default = "default_twitch_token_url")]
    pub token_url: String,
}

impl Default for IgdbConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            access_token: None,
            base_url: default_igdb_url(),
            token_url: default_twitch_token_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzConfig {
    #[serde(default = "default_musicbrainz_url")]
    pub base_url: String,
    #[serde(default = "default_cover_art_url")]
    pub cover_art_url: String,
    /// MusicBrainz rejects requests without a descriptive user agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Release-group tags need strictly more votes than this to become note tags.
    #[serde(default = "default_min_tag_votes")]
    pub min_tag_votes: u32,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            base_url: default_musicbrainz_url(),
            cover_art_url: default_cover_art_url(),
            user_agent: default_user_agent(),
            min_tag_votes: default_min_tag_votes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Note file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Directory names never descended into.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// Filename substrings that mark notes to leave alone.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            exclude_dirs: default_exclude_dirs(),
            skip_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterConfig {
    /// Target width in pixels; height follows the aspect ratio.
    #[serde(default = "default_poster_width")]
    pub width: u32,
    #[serde(default = "default_poster_quality")]
    pub quality: u8,
    /// Insert `![[poster]]` under the frontmatter.
    #[serde(default = "default_true")]
    pub embed: bool,
    /// Re-download even when the note already has a poster.
    #[serde(default)]
    pub refresh: bool,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            width: default_poster_width(),
            quality: default_poster_quality(),
            embed: true,
            refresh: false,
        }
    }
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_igdb_url() -> String {
    "https://api.igdb.com/v4".to_string()
}
fn default_twitch_token_url() -> String {
    "https://id.twitch.tv/oauth2/token".to_string()
}
fn default_musicbrainz_url() -> String {
    "https://musicbrainz.org/ws/2".to_string()
}
fn default_cover_art_url() -> String {
    "https://coverartarchive.org".to_string()
}
fn default_user_agent() -> String {
    format!(
        "shelf/{} ( {} )",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY")
    )
}
fn default_min_tag_votes() -> u32 {
    5
}
fn default_extension() -> String {
    "md".to_string()
}
fn default_exclude_dirs() -> Vec<String> {
    vec![".obsidian".to_string(), ".trash".to_string(), ".shelf".to_string()]
}
fn default_poster_width() -> u32 {
    200
}
fn default_poster_quality() -> u8 {
    85
}
fn default_true() -> bool {
    true
}

pub const MIN_POSTER_WIDTH: u32 = 50;
pub const MAX_POSTER_WIDTH: u32 = 2000;

impl ShelfConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/shelf/config.toml (global)
    /// 2. <vault>/.shelf/config.toml (vault)
    /// 3. <vault>/.shelf/config.local.toml (local, not synced)
    pub fn load(vault_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = vault_dir {
            let vault_config = dir.join(".shelf").join("config.toml");
            if vault_config.exists() {
                builder = builder.add_source(File::from(vault_config).required(false));
            }

            let local_config = dir.join(".shelf").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| ShelfError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| ShelfError::Config(e.to_string()))?;

        for warning in cfg.validate() {
            tracing::warn!("config: {}", warning);
        }
        Ok(cfg)
    }

    /// Defaults only, no files.
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Clamp out-of-range values and report what was changed. Never rejects a config.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !(MIN_POSTER_WIDTH..=MAX_POSTER_WIDTH).contains(&self.posters.width) {
            let clamped = self.posters.width.clamp(MIN_POSTER_WIDTH, MAX_POSTER_WIDTH);
            warnings.push(format!(
                "posters.width = {} out of range [{MIN_POSTER_WIDTH}, {MAX_POSTER_WIDTH}], clamping to {clamped}",
                self.posters.width
            ));
            self.posters.width = clamped;
        }

        if !(1..=100).contains(&self.posters.quality) {
            let clamped = self.posters.quality.clamp(1, 100);
            warnings.push(format!(
                "posters.quality = {} out of range [1, 100], clamping to {clamped}",
                self.posters.quality
            ));
            self.posters.quality = clamped;
        }

        let trimmed = self.vault.extension.trim_start_matches('.').to_string();
        if trimmed.is_empty() {
            warnings.push("vault.extension is empty, using 'md'".to_string());
            self.vault.extension = default_extension();
        } else if trimmed != self.vault.extension {
            warnings.push(format!(
                "vault.extension '{}' should not start with '.', using '{trimmed}'",
                self.vault.extension
            ));
            self.vault.extension = trimmed;
        }

        if self.musicbrainz.user_agent.trim().is_empty() {
            warnings.push("musicbrainz.user_agent is empty, using default".to_string());
            self.musicbrainz.user_agent = default_user_agent();
        }

        for (tag, names) in &self.genres {
            if names.is_empty() {
                warnings.push(format!("genres.{tag} maps no provider genres"));
            }
        }

        warnings
    }

    /// Provider genre name → configured note tag (case-insensitive).
    pub fn genre_tag(&self, genre: &str) -> Option<&str> {
        let wanted = genre.trim().to_lowercase();
        self.genres
            .iter()
            .find(|(_, names)| names.iter().any(|n| n.trim().to_lowercase() == wanted))
            .map(|(tag, _)| tag.as_str())
    }
}

/// `~/.config/shelf/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shelf").join("config.toml"))
}

/// Resolve a credential: config field first, then environment variable.
pub fn resolve_credential(
    configured: Option<&str>,
    env_var_override: Option<&str>,
    default_env_var: &str,
    provider_name: &str,
    setting: &str,
) -> Result<String> {
    if let Some(value) = configured {
        if !value.is_empty() {
            return Ok(value.to_string());
        }
    }

    let env_var_name = env_var_override.unwrap_or(default_env_var);

    match std::env::var(env_var_name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ShelfError::Config(format!(
            "{provider_name} requires credentials (set {setting} or {env_var_name})"
        ))),
    }
}
