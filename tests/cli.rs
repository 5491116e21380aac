//! Command-line behavior that does not need a real solc install.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn solc_batch() -> Command {
    Command::cargo_bin("solc-batch").unwrap()
}

#[test]
fn scan_lists_declarations_as_csv() {
    let tree = TempDir::new().unwrap();
    fs::write(
        tree.path().join("Vault.sol"),
        "pragma solidity ^0.8.0;\n\
         // contract Commented {}\n\
         contract Vault {}\n\
         library VaultMath {}\n",
    )
    .unwrap();

    solc_batch()
        .arg("scan")
        .arg(tree.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("path,line,kind,name,artifact"))
        .stdout(predicate::str::contains("3,contract,Vault,Vault_sol_Vault.hex"))
        .stdout(predicate::str::contains("4,library,VaultMath,Vault_sol_VaultMath.hex"))
        .stdout(predicate::str::contains("Commented").not());
}

#[test]
fn scan_writes_to_a_file() {
    let tree = TempDir::new().unwrap();
    fs::write(tree.path().join("One.sol"), "contract One {}\n").unwrap();
    let report = tree.path().join("report.csv");

    solc_batch()
        .arg("scan")
        .arg(tree.path().join("One.sol"))
        .arg("--output")
        .arg(&report)
        .assert()
        .success();

    let written = fs::read_to_string(&report).unwrap();
    assert!(written.contains("1,contract,One,One_sol_One.hex"), "{written}");
}

#[test]
fn scan_rejects_missing_input() {
    solc_batch()
        .arg("scan")
        .arg("no/such/path")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn compile_rejects_non_sol_file() {
    let tree = TempDir::new().unwrap();
    let file = tree.path().join("contract.txt");
    fs::write(&file, "pragma solidity ^0.8.0;").unwrap();

    solc_batch()
        .arg("compile")
        .arg(&file)
        .arg("--output-dir")
        .arg(tree.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(".sol extension"));
}

#[test]
fn compile_requires_the_metadata_table() {
    let tree = TempDir::new().unwrap();

    solc_batch()
        .arg("compile")
        .arg(tree.path())
        .arg("--output-dir")
        .arg(tree.path().join("out"))
        .arg("--csv-path")
        .arg(tree.path().join("info.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("metadata table not found"));
}

#[test]
fn compile_rejects_missing_input() {
    let tree = TempDir::new().unwrap();

    solc_batch()
        .arg("compile")
        .arg(tree.path().join("gone"))
        .arg("--output-dir")
        .arg(tree.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
