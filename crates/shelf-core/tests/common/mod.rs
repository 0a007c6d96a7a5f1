#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shelf_core::config::ShelfConfig;
use shelf_core::error::{Result, ShelfError};
use shelf_core::model::{Credit, CreditRole, MediaDetails, MediaKind, ProviderRecord};
use shelf_core::provider::MetadataProvider;
use shelf_core::vault::Vault;

/// In-memory provider: titles map to candidate lists, ids map to details.
#[derive(Default)]
pub struct FakeProvider {
    pub kind: Option<MediaKind>,
    results: HashMap<String, Vec<ProviderRecord>>,
    details: HashMap<String, MediaDetails>,
    pub searches: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Register a record returned for `query` and resolvable by id.
    pub fn with(mut self, query: &str, record: ProviderRecord) -> Self {
        let mut details = MediaDetails::new(record.clone());
        details.external_url = Some(format!("https://example.org/{}", record.id));
        details.poster_url = Some(format!("https://example.org/{}.jpg", record.id));
        details.credits.push(Credit::new(CreditRole::Director, "Jane Doe"));
        self.details.insert(record.id.clone(), details);
        self.results
            .entry(query.to_lowercase())
            .or_default()
            .push(record);
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }
}

impl MetadataProvider for FakeProvider {
    async fn search(&self, title: &str) -> Result<Vec<ProviderRecord>> {
        self.searches.lock().unwrap().push(title.to_string());
        Ok(self
            .results
            .get(&title.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn details(&self, id: &str) -> Result<MediaDetails> {
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| ShelfError::Provider(format!("unknown id {id}")))
    }

    fn kind(&self) -> MediaKind {
        self.kind.unwrap_or(MediaKind::Movie)
    }

    fn name(&self) -> &'static str {
        "Fake"
    }
}

pub fn movie(id: &str, title: &str, year: u16) -> ProviderRecord {
    ProviderRecord::new(id, title, Some(year), MediaKind::Movie).with_synopsis(format!("About {title}."))
}

pub fn tv(id: &str, title: &str, year: u16) -> ProviderRecord {
    ProviderRecord::new(id, title, Some(year), MediaKind::Tv)
}

pub struct TempVault {
    pub root: PathBuf,
    pub vault: Vault,
    pub config: ShelfConfig,
}

impl TempVault {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("shelf-it-{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(&root).unwrap();
        let config = ShelfConfig::default_config();
        let vault = Vault::new(&root, &config.vault);
        Self {
            root,
            vault,
            config,
        }
    }

    pub fn write(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root.join(rel).exists()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for TempVault {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
