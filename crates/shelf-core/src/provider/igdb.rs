use chrono::{DateTime, Datelike};
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{build_url, http_client, read_json, MetadataProvider};
use crate::config::{resolve_credential, IgdbConfig};
use crate::error::{Result, ShelfError};
use crate::model::{Credit, CreditRole, MediaDetails, MediaKind, ProviderRecord};

const COVER_URL: &str = "https://images.igdb.com/igdb/image/upload/t_cover_big";
const SEARCH_LIMIT: usize = 10;

/// IGDB (Twitch) game database. Queries are Apicalypse bodies POSTed to `/games`.
#[derive(Debug)]
pub struct IgdbProvider {
    client_id: String,
    client_secret: Option<String>,
    token: OnceCell<String>,
    config: IgdbConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Game {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_release_date: Option<i64>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    cover: Option<Cover>,
    #[serde(default)]
    involved_companies: Vec<InvolvedCompany>,
    #[serde(default)]
    game_modes: Vec<Named>,
    #[serde(default)]
    genres: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct Cover {
    #[serde(default)]
    image_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvolvedCompany {
    #[serde(default)]
    company: Option<Named>,
    #[serde(default)]
    developer: bool,
    #[serde(default)]
    publisher: bool,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: String,
}

impl IgdbProvider {
    pub fn from_config(config: &IgdbConfig) -> Result<Self> {
        let client_id = resolve_credential(
            config.client_id.as_deref(),
            None,
            "IGDB_CLIENT_ID",
            "IGDB",
            "igdb.client_id",
        )?;

        let token = OnceCell::new();
        let mut client_secret = None;
        match resolve_credential(
            config.access_token.as_deref(),
            None,
            "IGDB_ACCESS_TOKEN",
            "IGDB",
            "igdb.access_token",
        ) {
            Ok(access_token) => {
                let _ = token.set(access_token);
            }
            Err(_) => {
                client_secret = Some(resolve_credential(
                    config.client_secret.as_deref(),
                    None,
                    "IGDB_CLIENT_SECRET",
                    "IGDB",
                    "igdb.client_secret",
                )?);
            }
        }

        Ok(Self {
            client_id,
            client_secret,
            token,
            config: config.clone(),
            client: http_client(None)?,
        })
    }

    /// Twitch app access token, requested once per run with client credentials.
    async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let secret = self.client_secret.as_deref().ok_or_else(|| {
                    ShelfError::Config("IGDB requires an access token or client secret".into())
                })?;
                let url = build_url(
                    &self.config.token_url,
                    "",
                    &[
                        ("client_id", self.client_id.as_str()),
                        ("client_secret", secret),
                        ("grant_type", "client_credentials"),
                    ],
                )?;
                tracing::debug!("requesting Twitch access token");
                let resp = self.client.post(url).send().await?;
                let body: TokenResponse = read_json(resp, "Twitch").await?;
                Ok::<_, ShelfError>(body.access_token)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn query(&self, body: String) -> Result<Vec<Game>> {
        let token = self.access_token().await?;
        let url = build_url(&self.config.base_url, "games", &[])?;
        let resp = self
            .client
            .post(url)
            .header("Client-ID", &self.client_id)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;
        read_json(resp, "IGDB").await
    }
}

impl MetadataProvider for IgdbProvider {
    async fn search(&self, title: &str) -> Result<Vec<ProviderRecord>> {
        tracing::debug!(title, "IGDB search");
        let games = self.query(search_query(title)).await?;
        Ok(games.iter().map(record_from_game).collect())
    }

    async fn details(&self, id: &str) -> Result<MediaDetails> {
        let id: u64 = id
            .parse()
            .map_err(|_| ShelfError::InvalidInput(format!("IGDB game id must be numeric: {id}")))?;
        tracing::debug!(id, "IGDB details");

        let mut games = self.query(details_query(id)).await?;
        if games.is_empty() {
            return Err(ShelfError::NotFound(format!("IGDB game {id}")));
        }
        Ok(details_from_game(games.swap_remove(0)))
    }

    fn kind(&self) -> MediaKind {
        MediaKind::Game
    }

    fn name(&self) -> &'static str {
        "IGDB"
    }
}

fn search_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "search \"{escaped}\"; fields name, first_release_date, summary, url, cover.image_id; limit {SEARCH_LIMIT};"
    )
}

fn details_query(id: u64) -> String {
    format!(
        "fields name, first_release_date, summary, url, involved_companies.company.name, \
         involved_companies.developer, involved_companies.publisher, game_modes.name, \
         genres.name, cover.image_id; where id = {id};"
    )
}

/// Release year of a Unix timestamp, in UTC.
fn release_year(timestamp: Option<i64>) -> Option<u16> {
    let dt = DateTime::from_timestamp(timestamp?, 0)?;
    u16::try_from(dt.year()).ok()
}

fn record_from_game(g: &Game) -> ProviderRecord {
    ProviderRecord::new(
        g.id.to_string(),
        g.name.clone().unwrap_or_else(|| "Unknown".to_string()),
        release_year(g.first_release_date),
        MediaKind::Game,
    )
    .with_synopsis(g.summary.clone().unwrap_or_default())
}

/// Note tags for IGDB game modes.
fn mode_tags(modes: &[Named]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: &str| {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    };
    for mode in modes {
        let name = mode.name.to_lowercase();
        if name.contains("single player") || name.contains("singleplayer") {
            push("single-player");
        }
        if name.contains("multiplayer") && !name.contains("mmo") {
            push("multiplayer");
        }
        if name.contains("co-op") || name.contains("cooperative") {
            push("co-op");
        }
    }
    tags
}

fn details_from_game(g: Game) -> MediaDetails {
    let mut details = MediaDetails::new(record_from_game(&g));

    let company = |ic: &InvolvedCompany| ic.company.as_ref().map(|c| c.name.clone());
    if let Some(dev) = g.involved_companies.iter().filter(|ic| ic.developer).find_map(company) {
        details.credits.push(Credit::new(CreditRole::Developer, dev));
    }
    if let Some(publisher) = g.involved_companies.iter().filter(|ic| ic.publisher).find_map(company) {
        details.credits.push(Credit::new(CreditRole::Publisher, publisher));
    }

    details.external_url = g.url.filter(|u| !u.is_empty());
    details.poster_url = g
        .cover
        .and_then(|c| c.image_id)
        .filter(|id| !id.is_empty())
        .map(|id| format!("{COVER_URL}/{id}.jpg"));
    details.tags = mode_tags(&g.game_modes);
    details.genres = g
        .genres
        .into_iter()
        .map(|n| n.name)
        .filter(|n| !n.is_empty())
        .collect();
    details
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME_DETAILS: &str = r#"[{
        "id": 119133,
        "name": "Elden Ring",
        "first_release_date": 1645747200,
        "summary": "Rise, Tarnished.",
        "url": "https://www.igdb.com/games/elden-ring",
        "cover": {"id": 1, "image_id": "co4jni"},
        "involved_companies": [
            {"id": 1, "company": {"id": 2, "name": "Bandai Namco Entertainment"}, "developer": false, "publisher": true},
            {"id": 3, "company": {"id": 4, "name": "FromSoftware"}, "developer": true, "publisher": false}
        ],
        "game_modes": [
            {"id": 1, "name": "Single player"},
            {"id": 2, "name": "Multiplayer"},
            {"id": 3, "name": "Co-operative"},
            {"id": 5, "name": "Massively Multiplayer Online (MMO)"}
        ],
        "genres": [{"id": 12, "name": "Role-playing (RPG)"}, {"id": 31, "name": "Adventure"}]
    }]"#;

    #[test]
    fn test_details_normalization() {
        let mut games: Vec<Game> = serde_json::from_str(GAME_DETAILS).unwrap();
        let details = details_from_game(games.remove(0));

        assert_eq!(details.identity().stem(), "Elden Ring (2022)");
        assert_eq!(
            details.first(CreditRole::Developer).map(|c| c.name.as_str()),
            Some("FromSoftware")
        );
        assert_eq!(
            details.first(CreditRole::Publisher).map(|c| c.name.as_str()),
            Some("Bandai Namco Entertainment")
        );
        assert_eq!(
            details.poster_url.as_deref(),
            Some("https://images.igdb.com/igdb/image/upload/t_cover_big/co4jni.jpg")
        );
        assert_eq!(details.tags, vec!["single-player", "multiplayer", "co-op"]);
        assert_eq!(details.genres, vec!["Role-playing (RPG)", "Adventure"]);
    }

    #[test]
    fn test_release_year_is_utc() {
        // 2017-01-01T00:30:00Z would be 2016 in any timezone west of UTC.
        assert_eq!(release_year(Some(1483230600)), Some(2017));
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn test_unreleased_game_has_no_year() {
        let games: Vec<Game> = serde_json::from_str(r#"[{"id": 7, "name": "Hollow Knight: Silksong"}]"#).unwrap();
        let record = record_from_game(&games[0]);
        assert_eq!(record.year, None);
        assert_eq!(record.synopsis, "");
    }

    #[test]
    fn test_search_query_escapes_quotes() {
        let q = search_query(r#"The "Best" Game"#);
        assert!(q.starts_with(r#"search "The \"Best\" Game";"#));
        assert!(q.ends_with("limit 10;"));
    }

    #[test]
    fn test_from_config_with_access_token() {
        let config = IgdbConfig {
            client_id: Some("id".into()),
            access_token: Some("token".into()),
            ..IgdbConfig::default()
        };
        let provider = IgdbProvider::from_config(&config).unwrap();
        assert_eq!(provider.token.get().map(String::as_str), Some("token"));
        assert!(provider.client_secret.is_none());
    }
}
