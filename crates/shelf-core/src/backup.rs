use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use walkdir::WalkDir;

use crate::error::{Result, ShelfError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    pub path: PathBuf,
    pub files: usize,
}

/// `vault-backup-20261019-081500.tar.gz`
pub fn default_backup_name() -> String {
    format!(
        "vault-backup-{}.tar.gz",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    )
}

/// Resolve the CLI backup argument: an existing directory gets a timestamped
/// archive inside it, anything else is used as the archive path.
pub fn backup_destination(arg: &Path) -> PathBuf {
    if arg.is_dir() {
        arg.join(default_backup_name())
    } else {
        arg.to_path_buf()
    }
}

/// Archive every file under `root` into a gzip-compressed tar at `dest`.
///
/// Entries are stored relative to `root`. The archive itself is skipped when it
/// lives inside the vault.
pub fn create_backup(root: &Path, dest: &Path) -> Result<BackupSummary> {
    if !root.is_dir() {
        return Err(ShelfError::InvalidInput(format!(
            "vault root is not a directory: {}",
            root.display()
        )));
    }
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(dest)?;
    let dest_canonical = fs::canonicalize(dest)?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);
    tar.follow_symlinks(false);

    let mut files = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("backup: skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if fs::canonicalize(path).is_ok_and(|p| p == dest_canonical) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        tar.append_path_with_name(path, relative)?;
        files += 1;
    }

    let encoder = tar.into_inner()?;
    encoder.finish()?;

    tracing::info!(path = %dest.display(), files, "backup created");
    Ok(BackupSummary {
        path: dest.to_path_buf(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn archive_entries(path: &Path) -> Vec<String> {
        let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
        let mut names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_backup_contains_relative_paths() {
        let root = std::env::temp_dir().join(format!("shelf-backup-{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(root.join("Movies")).unwrap();
        fs::write(root.join("Movies").join("Heat.md"), "#movie").unwrap();
        fs::write(root.join("Index.md"), "[[Heat]]").unwrap();

        let dest = root.join("backup.tar.gz");
        let summary = create_backup(&root, &dest).unwrap();
        assert_eq!(summary.files, 2, "archive does not include itself");
        assert_eq!(archive_entries(&dest), vec!["Index.md", "Movies/Heat.md"]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_backup_destination_directory_gets_timestamped_name() {
        let dir = std::env::temp_dir();
        let dest = backup_destination(&dir);
        let name = dest.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("vault-backup-"));
        assert!(name.ends_with(".tar.gz"));

        let explicit = dir.join("shelf-explicit.tar.gz");
        assert_eq!(backup_destination(&explicit), explicit);
    }

    #[test]
    fn test_backup_missing_root() {
        let dest = std::env::temp_dir().join(format!("shelf-none-{}.tar.gz", uuid::Uuid::now_v7()));
        let err = create_backup(Path::new("/nonexistent/shelf"), &dest).unwrap_err();
        assert!(matches!(err, ShelfError::InvalidInput(_)));
    }
}
