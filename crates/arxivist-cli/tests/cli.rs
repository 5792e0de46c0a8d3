//! Integration tests for the arxivist CLI commands.
//!
//! Only commands that work offline are exercised. They run in serial because they share the
//! user's config directory.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::tempdir;

// Helper function to create a clean command instance whose home and config directory live in
// `home`, so no config file from the machine running the tests is read
fn arxivist(home: &Path) -> Command {
  let mut cmd = Command::cargo_bin("arxivist").unwrap();
  cmd
    .env("HOME", home)
    .env("XDG_CONFIG_HOME", home.join("config"))
    .env_remove("ARXIVIST_USER")
    .env_remove("ARXIVIST_TOKEN")
    .env_remove("RUST_LOG");
  cmd
}

// Where the CLI looks for its config file under the test home
fn config_file(home: &Path) -> PathBuf {
  let dir = if cfg!(target_os = "macos") {
    home.join("Library").join("Application Support")
  } else {
    home.join("config")
  };
  dir.join("arxivist").join("config.toml")
}

// Helper to get a temporary database path
fn temp_db() -> (tempfile::TempDir, PathBuf) {
  let dir = tempdir().unwrap();
  let db_path = dir.path().join("test.db");
  (dir, db_path)
}

#[test]
#[serial]
fn test_init_and_clean() {
  let (dir, db_path) = temp_db();

  arxivist(dir.path())
    .arg("init")
    .arg("--path")
    .arg(&db_path)
    .arg("--accept-defaults")
    .assert()
    .success()
    .stdout(predicate::str::contains("initialized successfully"));

  assert!(db_path.exists());

  // Reinitializing an existing database is accepted by default
  arxivist(dir.path())
    .arg("init")
    .arg("--path")
    .arg(&db_path)
    .arg("--accept-defaults")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removing existing database"));

  arxivist(dir.path())
    .arg("clean")
    .arg("--path")
    .arg(&db_path)
    .arg("--accept-defaults")
    .assert()
    .success()
    .stdout(predicate::str::contains("Database files cleaned"));

  assert!(!db_path.exists());

  arxivist(dir.path())
    .arg("clean")
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("No database found"));

  dir.close().unwrap();
}

#[test]
fn test_topics() {
  let dir = tempdir().unwrap();
  arxivist(dir.path())
    .arg("topics")
    .assert()
    .success()
    .stdout(predicate::str::contains("Machine Learning"))
    .stdout(predicate::str::contains("cs.LG"))
    .stdout(predicate::str::contains("Computer Vision"));
}

#[test]
#[serial]
fn test_bookmark_workflow() {
  let (dir, db_path) = temp_db();

  arxivist(dir.path())
    .args(["bookmark", "add", "https://arxiv.org/abs/2301.07041v2", "--user", "tester"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Bookmarked 2301.07041"));

  arxivist(dir.path())
    .args(["bookmark", "add", "2301.07041", "--user", "tester"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("already bookmarked"));

  arxivist(dir.path())
    .args(["bookmark", "add", "math.AG/0601001", "--user", "tester"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success();

  arxivist(dir.path())
    .args(["bookmark", "ids", "--user", "tester"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::eq("math.AG/0601001\n2301.07041\n"));

  // Bookmarks belong to a user
  arxivist(dir.path())
    .args(["bookmark", "ids", "--user", "someone-else"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::is_empty());

  arxivist(dir.path())
    .args(["bookmark", "remove", "2301.07041", "--user", "tester"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed bookmark"));

  arxivist(dir.path())
    .args(["bookmark", "ids", "--user", "tester"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::eq("math.AG/0601001\n"));

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_invalid_identifier_fails() {
  let (dir, db_path) = temp_db();

  arxivist(dir.path())
    .args(["bookmark", "add", "not-a-paper"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("InvalidIdentifier"));

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_feed_without_topics_asks_for_onboarding() {
  let (dir, db_path) = temp_db();

  arxivist(dir.path())
    .args(["feed", "--user", "new-user"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("not following any topics"));

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_onboard_with_arguments() {
  let (dir, db_path) = temp_db();

  arxivist(dir.path())
    .args(["onboard", "Machine Learning", "machine learning", "Robotics", "--user", "tester"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Following: Machine Learning, Robotics"));

  // Without topics and without a terminal there is nothing to pick from
  arxivist(dir.path())
    .args(["onboard", "--accept-defaults"])
    .arg("--path")
    .arg(&db_path)
    .assert()
    .failure();

  dir.close().unwrap();
}

#[test]
fn test_comments_require_sign_in() {
  let dir = tempdir().unwrap();

  arxivist(dir.path())
    .args(["comments", "list", "2301.07041"])
    .arg("--path")
    .arg(dir.path().join("test.db"))
    .assert()
    .failure()
    .stdout(predicate::str::contains("You need to sign in first"));
}

#[test]
fn test_help_lists_commands() {
  let dir = tempdir().unwrap();
  arxivist(dir.path())
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("bookmark"))
    .stdout(predicate::str::contains("comments"))
    .stdout(predicate::str::contains("summarize"));
}

#[test]
fn test_config_is_read_from_the_user_config_dir() {
  let dir = tempdir().unwrap();
  let config = config_file(dir.path());
  std::fs::create_dir_all(config.parent().unwrap()).unwrap();
  std::fs::write(&config, "[user\nid = ").unwrap();

  arxivist(dir.path())
    .arg("topics")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Config"));

  std::fs::write(&config, "[user]\nid = \"from-config\"\n").unwrap();

  arxivist(dir.path())
    .args(["bookmark", "add", "2301.07041"])
    .arg("--path")
    .arg(dir.path().join("test.db"))
    .assert()
    .success();

  arxivist(dir.path())
    .args(["bookmark", "ids", "--user", "from-config"])
    .arg("--path")
    .arg(dir.path().join("test.db"))
    .assert()
    .success()
    .stdout(predicate::eq("2301.07041\n"));
}
