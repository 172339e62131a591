use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("catalog")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("whoami"))
        .stdout(predicate::str::contains("products"))
        .stdout(predicate::str::contains("--api-url"));
}

#[test]
fn test_products_help_shows_subcommands() {
    cargo_bin_cmd!("catalog")
        .args(["products", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_missing_subcommand_fails() {
    cargo_bin_cmd!("catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
