mod common;

use std::process::Command;

use common::{ArchiveBuilder, Inbox, wad_blob, zip_bytes};

const BIN: &str = env!("CARGO_BIN_EXE_efiling-extract");

fn jwx_archive() -> Vec<u8> {
    ArchiveBuilder::new(
        zip_bytes(&[
            ("A.xml", b"<a/>".as_slice()),
            ("images/B.tif", b"II*\0".as_slice()),
        ]),
        wad_blob(&zip_bytes(&[("C.xml", b"<c/>".as_slice())])),
    )
    .build()
}

#[test]
fn extracts_into_per_archive_directory() {
    let inbox = Inbox::new();
    let archive = inbox.put("NNF20240115093000_A1631.JWX", &jwx_archive());
    let out = inbox.path("out");

    let status = Command::new(BIN)
        .arg("-q")
        .arg("-d")
        .arg(&out)
        .arg(&archive)
        .status()
        .unwrap();
    assert!(status.success());

    let root = out.join("NNF20240115093000_A1631");
    assert_eq!(std::fs::read(root.join("A.xml")).unwrap(), b"<a/>");
    assert_eq!(std::fs::read(root.join("images/B.tif")).unwrap(), b"II*\0");
    assert_eq!(std::fs::read(root.join("C.xml")).unwrap(), b"<c/>");
}

#[test]
fn lists_entries_in_archive_order() {
    let inbox = Inbox::new();
    let archive = inbox.put("NNF20240115093000_A1631.JWX", &jwx_archive());

    let output = Command::new(BIN).arg("-l").arg(&archive).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        ["A.xml", "images/B.tif", "C.xml"]
    );
}

#[test]
fn check_mode_reports_variants_without_reading() {
    let inbox = Inbox::new();
    // Neither file exists.
    let good = inbox.path("AER20240115093000_A1631.JPD");
    let bad = inbox.path("NNF20240115093000_A1631.JPD");

    let output = Command::new(BIN).arg("--check").arg(&good).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("AAA/JPD"));

    let output = Command::new(BIN).arg("--check").arg(&bad).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported archive format"));
}

#[test]
fn one_bad_archive_fails_the_run_but_not_the_others() {
    let inbox = Inbox::new();
    let good = inbox.put("NNF20240115093000_A1631.JWX", &jwx_archive());
    let bad = inbox.put("NNF20240115093001_A1631.JWX", &jwx_archive()[..30]);
    let out = inbox.path("out");

    let status = Command::new(BIN)
        .arg("-q")
        .arg("-d")
        .arg(&out)
        .arg(&good)
        .arg(&bad)
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(out.join("NNF20240115093000_A1631/C.xml").exists());
}
