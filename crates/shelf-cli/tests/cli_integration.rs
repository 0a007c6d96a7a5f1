//! CLI integration tests that run the actual shelf binary.
//! Marked `#[ignore]` to skip in normal `cargo test`.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn shelf() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_shelf"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn temp_vault(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shelf-cli-{name}-{}", uuid::Uuid::now_v7()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
#[ignore]
fn test_cli_help_lists_commands() {
    let output = shelf().arg("--help").output().expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["add", "resolve", "fix-links", "posters"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
#[ignore]
fn test_cli_fix_links_rewrites_and_backs_up() {
    let vault = temp_vault("fix");
    fs::write(vault.join("Heat (1995).md"), "#movie\n").unwrap();
    fs::write(vault.join("Journal.md"), "Saw [[Heat|that heist film]].\n").unwrap();
    let backup = std::env::temp_dir().join(format!("shelf-cli-backup-{}.tar.gz", uuid::Uuid::now_v7()));

    let output = shelf()
        .arg("fix-links")
        .arg(&vault)
        .arg(&backup)
        .arg("--non-interactive")
        .output()
        .expect("failed to execute");
    assert!(
        output.status.success(),
        "fix-links failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        fs::read_to_string(vault.join("Journal.md")).unwrap(),
        "Saw [[Heat (1995)|that heist film]].\n"
    );
    assert!(backup.exists(), "backup archive written");

    let _ = fs::remove_dir_all(&vault);
    let _ = fs::remove_file(&backup);
}

#[test]
#[ignore]
fn test_cli_dry_run_changes_nothing() {
    let vault = temp_vault("dry");
    fs::write(vault.join("Heat (1995).md"), "#movie\n").unwrap();
    fs::write(vault.join("Journal.md"), "[[Heat]]\n").unwrap();
    let backup = vault.join("never.tar.gz");

    let output = shelf()
        .arg("fix-links")
        .arg(&vault)
        .arg(&backup)
        .args(["--non-interactive", "--dry-run"])
        .output()
        .expect("failed to execute");
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(vault.join("Journal.md")).unwrap(), "[[Heat]]\n");
    assert!(!backup.exists());

    let _ = fs::remove_dir_all(&vault);
}

#[test]
#[ignore]
fn test_cli_missing_credentials_fail_before_backup() {
    let vault = temp_vault("creds");
    fs::write(vault.join("Heat.md"), "#movie\n").unwrap();
    let backup = vault.join("backup.tar.gz");

    let output = shelf()
        .env_remove("TMDB_API_KEY")
        .env("HOME", &vault)
        .env("XDG_CONFIG_HOME", &vault)
        .arg("resolve")
        .arg(&vault)
        .arg(&backup)
        .args(["--kind", "movie", "--non-interactive"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success(), "resolve without a TMDB key should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("TMDB_API_KEY"));
    assert!(!backup.exists());
    assert!(vault.join("Heat.md").exists());

    let _ = fs::remove_dir_all(&vault);
}

#[test]
#[ignore]
fn test_cli_rejects_unknown_kind() {
    let vault = temp_vault("kind");
    let output = shelf()
        .arg("resolve")
        .arg(&vault)
        .arg(vault.join("b.tar.gz"))
        .args(["--kind", "podcast"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
    let _ = fs::remove_dir_all(&vault);
}
