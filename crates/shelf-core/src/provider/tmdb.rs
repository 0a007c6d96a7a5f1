use serde::Deserialize;

use super::{build_url, http_client, read_json, year_from_date, MetadataProvider};
use crate::config::{resolve_credential, TmdbConfig};
use crate::error::Result;
use crate::model::{Credit, CreditRole, MediaDetails, MediaKind, ProviderRecord};

const TOP_CAST: usize = 3;

/// The Movie Database, for movies and TV series.
#[derive(Debug)]
pub struct TmdbProvider {
    kind: MediaKind,
    api_key: String,
    config: TmdbConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    origin_country: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    genres: Vec<Named>,
    #[serde(default)]
    created_by: Vec<Named>,
    #[serde(default)]
    credits: Credits,
    #[serde(default)]
    external_ids: ExternalIds,
    #[serde(default)]
    imdb_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
    #[serde(default)]
    crew: Vec<CrewMember>,
}

#[derive(Debug, Deserialize)]
struct CastMember {
    name: String,
    #[serde(default)]
    character: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrewMember {
    name: String,
    #[serde(default)]
    job: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalIds {
    #[serde(default)]
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

impl TmdbProvider {
    pub fn from_config(kind: MediaKind, config: &TmdbConfig) -> Result<Self> {
        let api_key = resolve_credential(
            config.api_key.as_deref(),
            config.env_var.as_deref(),
            "TMDB_API_KEY",
            "TMDB",
            "tmdb.api_key",
        )?;
        Ok(Self {
            kind,
            api_key,
            config: config.clone(),
            client: http_client(None)?,
        })
    }

    fn media_path(&self) -> &'static str {
        match self.kind {
            MediaKind::Tv => "tv",
            _ => "movie",
        }
    }
}

impl MetadataProvider for TmdbProvider {
    async fn search(&self, title: &str) -> Result<Vec<ProviderRecord>> {
        let url = build_url(
            &self.config.base_url,
            &format!("search/{}", self.media_path()),
            &[
                ("api_key", self.api_key.as_str()),
                ("query", title),
                ("language", self.config.language.as_str()),
            ],
        )?;
        tracing::debug!(title, kind = %self.kind, "TMDB search");

        let resp = self.client.get(url).send().await?;
        let body: SearchResponse = read_json(resp, "TMDB").await?;
        Ok(body
            .results
            .iter()
            .map(|r| record_from_search(r, self.kind))
            .collect())
    }

    async fn details(&self, id: &str) -> Result<MediaDetails> {
        let url = build_url(
            &self.config.base_url,
            &format!("{}/{id}", self.media_path()),
            &[
                ("api_key", self.api_key.as_str()),
                ("language", self.config.language.as_str()),
                ("append_to_response", "credits,external_ids"),
            ],
        )?;
        tracing::debug!(id, kind = %self.kind, "TMDB details");

        let resp = self.client.get(url).send().await?;
        let body: DetailsResponse = read_json(resp, "TMDB").await?;
        Ok(details_from_response(
            body,
            self.kind,
            &self.config.image_base_url,
        ))
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        "TMDB"
    }
}

fn record_from_search(r: &SearchResult, kind: MediaKind) -> ProviderRecord {
    let title = r
        .title
        .clone()
        .or_else(|| r.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let year = year_from_date(r.release_date.as_deref().or(r.first_air_date.as_deref()));

    let mut record = ProviderRecord::new(r.id.to_string(), title, year, kind)
        .with_synopsis(r.overview.clone().unwrap_or_default());
    if !r.origin_country.is_empty() {
        record = record.with_qualifier(r.origin_country.join("/"));
    }
    record
}

fn details_from_response(d: DetailsResponse, kind: MediaKind, image_base_url: &str) -> MediaDetails {
    let title = d
        .title
        .or(d.name)
        .unwrap_or_else(|| "Unknown".to_string());
    let year = year_from_date(d.release_date.as_deref().or(d.first_air_date.as_deref()));
    let record = ProviderRecord::new(d.id.to_string(), title, year, kind)
        .with_synopsis(d.overview.unwrap_or_default());

    let mut details = MediaDetails::new(record);

    match kind {
        MediaKind::Tv => {
            if let Some(creator) = d.created_by.first() {
                details
                    .credits
                    .push(Credit::new(CreditRole::Creator, creator.name.clone()));
            }
        }
        _ => {
            if let Some(director) = d
                .credits
                .crew
                .iter()
                .find(|c| c.job.as_deref() == Some("Director"))
            {
                details
                    .credits
                    .push(Credit::new(CreditRole::Director, director.name.clone()));
            }
        }
    }

    for member in d.credits.cast.iter().take(TOP_CAST) {
        details.credits.push(Credit::cast(
            member.name.clone(),
            member.character.clone().unwrap_or_else(|| "Unknown".to_string()),
        ));
    }

    details.external_url = d
        .external_ids
        .imdb_id
        .or(d.imdb_id)
        .filter(|id| !id.is_empty())
        .map(|id| format!("https://www.imdb.com/title/{id}"));

    details.poster_url = d
        .poster_path
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}{}", image_base_url.trim_end_matches('/'), p));

    details.genres = d.genres.into_iter().map(|g| g.name).collect();
    details
}
