use serde::Deserialize;

use super::{build_url, http_client, read_json, year_from_date, MetadataProvider};
use crate::config::MusicBrainzConfig;
use crate::error::Result;
use crate::model::{Credit, CreditRole, MediaDetails, MediaKind, ProviderRecord};

const SEARCH_LIMIT: &str = "25";
const MAX_TAGS: usize = 5;
const UNKNOWN_ARTIST: &str = "Various Artists";
const UNKNOWN_LABEL: &str = "Independent";

/// MusicBrainz release search, with covers from the Cover Art Archive.
/// No credentials, but every request must carry a descriptive User-Agent.
#[derive(Debug)]
pub struct MusicBrainzProvider {
    config: MusicBrainzConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    disambiguation: Option<String>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
    #[serde(rename = "label-info", default)]
    label_info: Vec<LabelInfo>,
    #[serde(rename = "release-group", default)]
    release_group: Option<ReleaseGroup>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artist: Option<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct LabelInfo {
    #[serde(default)]
    label: Option<Label>,
}

#[derive(Debug, Deserialize)]
struct Label {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseGroup {
    #[serde(rename = "primary-type", default)]
    primary_type: Option<String>,
    #[serde(rename = "secondary-types", default)]
    secondary_types: Vec<String>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    #[serde(default)]
    count: i64,
}

impl MusicBrainzProvider {
    pub fn from_config(config: &MusicBrainzConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            client: http_client(Some(&config.user_agent))?,
        })
    }
}

impl MetadataProvider for MusicBrainzProvider {
    async fn search(&self, title: &str) -> Result<Vec<ProviderRecord>> {
        let query = format!(
            "release:\"{}\" AND status:official AND primarytype:album",
            title.replace('"', "")
        );
        let url = build_url(
            &self.config.base_url,
            "release",
            &[("query", query.as_str()), ("fmt", "json"), ("limit", SEARCH_LIMIT)],
        )?;
        tracing::debug!(title, "MusicBrainz search");

        let resp = self.client.get(url).send().await?;
        let body: SearchResponse = read_json(resp, "MusicBrainz").await?;
        Ok(body.releases.iter().map(record_from_release).collect())
    }

    async fn details(&self, id: &str) -> Result<MediaDetails> {
        let url = build_url(
            &self.config.base_url,
            &format!("release/{id}"),
            &[
                ("inc", "artists+labels+release-groups+tags"),
                ("fmt", "json"),
            ],
        )?;
        tracing::debug!(id, "MusicBrainz details");

        let resp = self.client.get(url).send().await?;
        let body: Release = read_json(resp, "MusicBrainz").await?;
        Ok(details_from_release(
            body,
            &self.config.cover_art_url,
            self.config.min_tag_votes,
        ))
    }

    fn kind(&self) -> MediaKind {
        MediaKind::Album
    }

    fn name(&self) -> &'static str {
        "MusicBrainz"
    }
}

/// Credited artists joined the way they are printed on the sleeve.
fn artist_name(credits: &[ArtistCredit]) -> String {
    let names: Vec<&str> = credits
        .iter()
        .filter_map(|c| {
            c.name
                .as_deref()
                .or_else(|| c.artist.as_ref().map(|a| a.name.as_str()))
        })
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        names.join(" & ")
    }
}

fn label_name(labels: &[LabelInfo]) -> String {
    labels
        .iter()
        .find_map(|l| l.label.as_ref().map(|l| l.name.clone()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// "Album, Live (Deluxe Edition)"
fn qualifier(release: &Release) -> Option<String> {
    let mut types = Vec::new();
    if let Some(ref group) = release.release_group {
        types.extend(group.primary_type.iter().cloned());
        types.extend(group.secondary_types.iter().cloned());
    }
    let mut out = types.join(", ");
    if let Some(d) = release.disambiguation.as_deref().filter(|d| !d.is_empty()) {
        if out.is_empty() {
            out = d.to_string();
        } else {
            out.push_str(&format!(" ({d})"));
        }
    }
    (!out.is_empty()).then_some(out)
}

fn record_from_release(r: &Release) -> ProviderRecord {
    let mut record = ProviderRecord::new(
        r.id.clone(),
        r.title.clone(),
        year_from_date(r.date.as_deref()),
        MediaKind::Album,
    )
    .with_artist(artist_name(&r.artist_credit));
    if let Some(q) = qualifier(r) {
        record = record.with_qualifier(q);
    }
    record
}

fn type_tag(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

fn details_from_release(r: Release, cover_art_url: &str, min_tag_votes: u32) -> MediaDetails {
    let mut details = MediaDetails::new(record_from_release(&r));
    let artist = details.record.artist.clone().unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    details.credits.push(Credit::new(CreditRole::Artist, artist));
    details
        .credits
        .push(Credit::new(CreditRole::Label, label_name(&r.label_info)));

    details.external_url = Some(format!("https://musicbrainz.org/release/{}", r.id));
    details.poster_url = Some(format!(
        "{}/release/{}/front",
        cover_art_url.trim_end_matches('/'),
        r.id
    ));

    let group = r.release_group.unwrap_or_default();
    details.tags = group.secondary_types.iter().map(|t| type_tag(t)).collect();

    let mut tags = group.tags;
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    details.genres = tags
        .into_iter()
        .filter(|t| t.count > i64::from(min_tag_votes))
        .take(MAX_TAGS)
        .map(|t| t.name)
        .collect();
    details
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"{
        "created": "2026-10-01T00:00:00.000Z",
        "count": 2,
        "releases": [
            {
                "id": "b84ee12a-09ef-421b-82de-0441a926375b",
                "title": "OK Computer",
                "date": "1997-05-21",
                "artist-credit": [{"name": "Radiohead", "artist": {"id": "a74b1b7f", "name": "Radiohead"}}],
                "release-group": {"primary-type": "Album", "secondary-types": []}
            },
            {
                "id": "0b6b4ba0-d36f-47bd-b4ea-6a5b91842d29",
                "title": "OK Computer OKNOTOK 1997 2017",
                "date": "2017-06-23",
                "disambiguation": "remaster",
                "artist-credit": [{"artist": {"id": "a74b1b7f", "name": "Radiohead"}}],
                "release-group": {"primary-type": "Album", "secondary-types": ["Compilation"]}
            }
        ]
    }"#;

    const DETAILS: &str = r#"{
        "id": "f0f4b0a8-7e2e-4b1c-9e7c-000000000001",
        "title": "Watch the Throne",
        "date": "2011-08-08",
        "artist-credit": [
            {"name": "JAY-Z", "joinphrase": " & ", "artist": {"name": "JAY-Z"}},
            {"name": "Kanye West", "artist": {"name": "Kanye West"}}
        ],
        "label-info": [{"catalog-number": "B0015", "label": {"name": "Roc-A-Fella Records"}}],
        "release-group": {
            "primary-type": "Album",
            "secondary-types": ["Live", "Spoken Word"],
            "tags": [
                {"name": "pop rap", "count": 3},
                {"name": "hip hop", "count": 12},
                {"name": "east coast hip hop", "count": 6},
                {"name": "hardcore", "count": 5}
            ]
        }
    }"#;

    #[test]
    fn test_search_normalization() {
        let body: SearchResponse = serde_json::from_str(SEARCH).unwrap();
        let records: Vec<_> = body.releases.iter().map(record_from_release).collect();

        assert_eq!(records[0].display_title(), "Radiohead - OK Computer");
        assert_eq!(records[0].year, Some(1997));
        assert_eq!(records[0].qualifier.as_deref(), Some("Album"));
        assert_eq!(
            records[1].qualifier.as_deref(),
            Some("Album, Compilation (remaster)")
        );
        assert_eq!(records[1].artist.as_deref(), Some("Radiohead"));
    }

    #[test]
    fn test_details_normalization() {
        let release: Release = serde_json::from_str(DETAILS).unwrap();
        let details = details_from_release(release, "https://coverartarchive.org/", 5);

        assert_eq!(details.identity().stem(), "JAY-Z & Kanye West - Watch the Throne (2011)");
        assert_eq!(
            details.first(CreditRole::Label).map(|c| c.name.as_str()),
            Some("Roc-A-Fella Records")
        );
        assert_eq!(
            details.poster_url.as_deref(),
            Some("https://coverartarchive.org/release/f0f4b0a8-7e2e-4b1c-9e7c-000000000001/front")
        );
        assert_eq!(
            details.external_url.as_deref(),
            Some("https://musicbrainz.org/release/f0f4b0a8-7e2e-4b1c-9e7c-000000000001")
        );
        assert_eq!(details.tags, vec!["live", "spoken-word"]);
        // Votes must exceed the threshold; ordered by count.
        assert_eq!(details.genres, vec!["hip hop", "east coast hip hop"]);
    }

    #[test]
    fn test_missing_artist_and_label() {
        let release: Release = serde_json::from_str(r#"{"id": "x", "title": "Untitled"}"#).unwrap();
        let details = details_from_release(release, "https://coverartarchive.org", 0);
        assert_eq!(details.record.artist.as_deref(), Some("Various Artists"));
        assert_eq!(
            details.first(CreditRole::Label).map(|c| c.name.as_str()),
            Some("Independent")
        );
        assert!(details.tags.is_empty());
        assert_eq!(details.record.year, None);
    }
}
