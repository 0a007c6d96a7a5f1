//! Metadata providers. Each one normalizes its API responses into
//! [`ProviderRecord`] / [`MediaDetails`] so nothing downstream sees provider
//! field names.

mod igdb;
mod musicbrainz;
mod tmdb;

pub use igdb::IgdbProvider;
pub use musicbrainz::MusicBrainzProvider;
pub use tmdb::TmdbProvider;

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::ShelfConfig;
use crate::error::{Result, ShelfError};
use crate::model::{MediaDetails, MediaKind, ProviderRecord};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Search and lookup against one external metadata source.
pub trait MetadataProvider: Send + Sync {
    /// Candidates for a title, in provider order.
    fn search(
        &self,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ProviderRecord>>> + Send;

    /// Full record for an id returned by [`search`](Self::search).
    fn details(&self, id: &str) -> impl std::future::Future<Output = Result<MediaDetails>> + Send;

    /// Kind of media this provider instance returns.
    fn kind(&self) -> MediaKind;

    fn name(&self) -> &'static str;
}

/// Provider for a media kind, selected from configuration.
#[derive(Debug)]
pub enum Provider {
    Tmdb(TmdbProvider),
    Igdb(IgdbProvider),
    MusicBrainz(MusicBrainzProvider),
}

impl Provider {
    /// Build the provider for `kind`. Missing credentials fail here, before any
    /// note is touched.
    pub fn from_config(kind: MediaKind, config: &ShelfConfig) -> Result<Self> {
        match kind {
            MediaKind::Movie | MediaKind::Tv => {
                Ok(Self::Tmdb(TmdbProvider::from_config(kind, &config.tmdb)?))
            }
            MediaKind::Game => Ok(Self::Igdb(IgdbProvider::from_config(&config.igdb)?)),
            MediaKind::Album => Ok(Self::MusicBrainz(MusicBrainzProvider::from_config(
                &config.musicbrainz,
            )?)),
        }
    }
}

impl MetadataProvider for Provider {
    async fn search(&self, title: &str) -> Result<Vec<ProviderRecord>> {
        match self {
            Self::Tmdb(p) => p.search(title).await,
            Self::Igdb(p) => p.search(title).await,
            Self::MusicBrainz(p) => p.search(title).await,
        }
    }

    async fn details(&self, id: &str) -> Result<MediaDetails> {
        match self {
            Self::Tmdb(p) => p.details(id).await,
            Self::Igdb(p) => p.details(id).await,
            Self::MusicBrainz(p) => p.details(id).await,
        }
    }

    fn kind(&self) -> MediaKind {
        match self {
            Self::Tmdb(p) => p.kind(),
            Self::Igdb(p) => p.kind(),
            Self::MusicBrainz(p) => p.kind(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Tmdb(p) => p.name(),
            Self::Igdb(p) => p.name(),
            Self::MusicBrainz(p) => p.name(),
        }
    }
}

pub(crate) fn http_client(user_agent: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(HTTP_TIMEOUT);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua.to_string());
    }
    Ok(builder.build()?)
}

pub(crate) fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> Result<reqwest::Url> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    reqwest::Url::parse_with_params(&raw, params)
        .map_err(|e| ShelfError::Provider(format!("invalid URL '{raw}': {e}")))
}

/// Decode a JSON response, turning non-2xx statuses into provider errors.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    provider: &str,
) -> Result<T> {
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(ShelfError::Provider(format!(
            "{provider} API error {status}: {text}"
        )));
    }

    resp.json()
        .await
        .map_err(|e| ShelfError::Provider(format!("{provider} response parse error: {e}")))
}

/// Year from an ISO-ish date: `"2010-07-15"`, `"2010-07"`, `"2010"`.
pub(crate) fn year_from_date(date: Option<&str>) -> Option<u16> {
    let date = date?.trim();
    date.get(..4)
        .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|y| y.parse().ok())
}
