use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use contentops_core::model::Limitation;
use contentops_core::{ContentId, Snapshot, SnapshotBuilder};
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn seed(temp: &TempDir) -> PathBuf {
    let path = temp.child("repository.json").to_path_buf();
    SnapshotBuilder::new()
        .with_admin(14)
        .user(20, "editor", "Ed Itor", "ed@example.com")
        .role(7, "editor", &[("content", "*")])
        .folder(1, 1, None)
        .folder(2, 2, Some(1))
        .folder(3, 3, Some(1))
        .article(10, 10, Some(2), r#"<p>See <link url_id="42">here</link> now</p>"#)
        .article(11, 11, Some(2), "<p>plain</p>")
        .assignment(40, 7, 20, Some(Limitation::subtree("/1/3/")))
        .build()
        .save(&path)
        .unwrap();
    path
}

fn contentops(temp: &TempDir, repository: &Path) -> Command {
    let mut cmd = Command::cargo_bin("contentops").unwrap();
    cmd.current_dir(temp.path())
        .env_remove("CONTENTOPS_YES")
        .env_remove("RUST_LOG")
        .arg("--no-color")
        .arg("--repository")
        .arg(repository);
    cmd
}

fn has_content(repository: &Path, id: u64) -> bool {
    Snapshot::load(repository)
        .unwrap()
        .contents
        .iter()
        .any(|c| c.id == ContentId(id))
}

#[test]
fn test_version_subcommand() {
    let mut cmd = Command::cargo_bin("contentops").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("contentops 0.1.0"));
}

#[test]
fn test_version_subcommand_json() {
    let mut cmd = Command::cargo_bin("contentops").unwrap();
    cmd.args(["version", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#"\{"name":"contentops","version":"0\.1\.0"\}"#).unwrap());
}

#[test]
fn test_delete_after_confirmation() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["delete", "10,404,"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Content objects to delete"))
        .stdout(predicate::str::contains("10 - deleted 'Article 10'"))
        .stdout(predicate::str::contains("404 - failed (not_found)"))
        .stdout(predicate::str::contains("The following errors were reported:"));

    assert!(!has_content(&repository, 10));
    assert!(has_content(&repository, 11));
}

#[test]
fn test_declined_confirmation_changes_nothing() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);
    let before = std::fs::read_to_string(&repository).unwrap();

    contentops(&temp, &repository)
        .args(["delete", "10"])
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Process ended. No changes made."))
        .stdout(predicate::str::contains("10 - ").not());

    assert_eq!(std::fs::read_to_string(&repository).unwrap(), before);
}

#[test]
fn test_empty_list_warns_without_prompt() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["republish", " , ,"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records to process"))
        .stdout(predicate::str::contains("[y/N]").not());
}

#[test]
fn test_invalid_token_is_fatal() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["delete", "10,abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid input"));

    assert!(has_content(&repository, 10));
}

#[test]
fn test_missing_repository_is_fatal() {
    let temp = TempDir::new().unwrap();
    let missing = temp.child("nowhere.json").to_path_buf();

    contentops(&temp, &missing)
        .args(["delete", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Repository snapshot not found"));
}

#[test]
fn test_move_from_file_with_yes() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);
    let input = temp.child("moves.csv");
    input
        .write_str("locationId,newParentLocationId,\n2,3,\n3,2,\n")
        .unwrap();

    contentops(&temp, &repository)
        .args(["--yes", "move", "--input"])
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 ==> 3 - moved /1/2/ to /1/3/"))
        .stdout(predicate::str::contains("3 ==> 2 - failed (invalid_argument)"));

    let snapshot = Snapshot::load(&repository).unwrap();
    let article = snapshot
        .locations
        .iter()
        .find(|l| l.id.raw() == 10)
        .unwrap();
    assert_eq!(article.path_string, "/1/3/2/10/");
}

#[test]
fn test_missing_move_file_is_fatal() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["--yes", "move", "--input", "missing.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input source not found"));
}

#[test]
fn test_strip_links_dry_run_does_not_prompt_or_publish() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);
    let before = std::fs::read_to_string(&repository).unwrap();

    contentops(&temp, &repository)
        .args(["strip-links", "10,11", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 - skipped: 1 link(s) would be stripped"))
        .stdout(predicate::str::contains("11 - skipped: no links found"))
        .stdout(predicate::str::contains("[y/N]").not());

    assert_eq!(std::fs::read_to_string(&repository).unwrap(), before);
}

#[test]
fn test_strip_links_json_output() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    let output = contentops(&temp, &repository)
        .args(["--yes", "--output", "json", "strip-links", "10,404"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3, "{stdout}");
    assert_eq!(lines[0]["type"], "record");
    assert_eq!(lines[0]["status"], "success");
    assert_eq!(lines[0]["changed"], true);
    assert_eq!(lines[1]["status"], "failure");
    assert_eq!(lines[1]["kind"], "not_found");

    let summary = &lines[2];
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["summary"]["changed"], 1);
    assert_eq!(summary["summary"]["failed"], 1);
    assert_eq!(summary["failures"][0]["key"], "404");
    assert_eq!(summary["failures"][0]["index"], 1);
    assert!(summary["failures"][0]["message"]
        .as_str()
        .unwrap()
        .contains("404"));
}

#[test]
fn test_roles_list_shows_assignments() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["roles", "20", "--list"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: Ed Itor(20)"))
        .stdout(predicate::str::contains("UserRoleID"))
        .stdout(predicate::str::contains("/1/3/"))
        .stdout(predicate::str::contains("Subtree"));
}

#[test]
fn test_roles_list_declined_prints_nothing_else() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["roles", "20", "--list"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Is this the correct user?"))
        .stdout(predicate::str::contains("Process ended. No changes made."))
        .stdout(predicate::str::contains("UserRoleID").not());
}

#[test]
fn test_roles_add_and_remove() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["roles", "20", "--add", "2", "--remove", "40"])
        .write_stdin("y\ny\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Email: ed@example.com"))
        .stdout(predicate::str::contains("editor -> 2 (Subtree limitation)"))
        .stdout(predicate::str::contains("40 - removed assignment 40"));

    let snapshot = Snapshot::load(&repository).unwrap();
    let limits: Vec<_> = snapshot
        .role_assignments
        .iter()
        .filter(|a| a.user_id.raw() == 20)
        .map(|a| a.limitation.clone())
        .collect();
    assert_eq!(limits, vec![Some(Limitation::subtree("/1/2/"))]);
}

#[test]
fn test_roles_unknown_user_is_fatal() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["roles", "999", "--remove", "40"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load user 999"));
}

#[test]
fn test_roles_unknown_role_changes_nobody() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);
    let config = temp.child("custom.toml");
    config
        .write_str("[defaults]\nrole_identifier = \"nonexistent\"\n")
        .unwrap();

    contentops(&temp, &repository)
        .arg("--config")
        .arg(config.path())
        .args(["roles", "20", "--add", "2"])
        .write_stdin("y\ny\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Could not load Role with given identifier. No users changed.",
        ));
}

#[test]
fn test_roles_requires_an_action() {
    let temp = TempDir::new().unwrap();
    let repository = seed(&temp);

    contentops(&temp, &repository)
        .args(["roles", "20"])
        .assert()
        .failure();
}
