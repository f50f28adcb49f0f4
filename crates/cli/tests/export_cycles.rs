use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write(path: &PathBuf, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn export_terminates_on_cyclic_and_self_links() {
    let tmp = tempdir().unwrap();
    let store = tmp.path().join("store");
    write(&store.join("A.md"), "To [[B]].\n");
    write(&store.join("B.md"), "Back to [[A]] and me [[B]].\n");

    let out = tmp.path().join("out");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vpk"));
    cmd.env("XDG_CONFIG_HOME", tmp.path().join("xdg"));
    cmd.args([
        "export",
        store.join("A.md").to_str().unwrap(),
        "--vault",
        store.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("OK   vpk export"))
        .stdout(predicate::str::contains("notes: 2"));

    let a = fs::read_to_string(out.join("A.md")).unwrap();
    assert!(a.contains("[[references/B.md]]"));

    let b = fs::read_to_string(out.join("references/B.md")).unwrap();
    assert!(b.contains("[[A.md]]"));
    assert!(b.contains("[[references/B.md]]"));
}
