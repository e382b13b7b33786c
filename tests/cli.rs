//! Runs the `epub-inspect` binary against EPUBs written to a temp directory.

#![cfg(feature = "cli")]

mod common;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use common::{epub_with_opf, CONTENT_OPF};

fn write_epub(name: &str, data: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "epub-inspect-cli-{}-{}.epub",
        std::process::id(),
        name
    ));
    std::fs::write(&path, data).unwrap();
    path
}

fn run_cli(args: &[&str], epub: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_epub-inspect"))
        .args(args)
        .arg(epub)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stderr_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .map(str::to_string)
        .collect()
}

fn deprecated_font_opf() -> String {
    CONTENT_OPF.replace(
        "</manifest>",
        r#"<item id="font" href="f.ttf" media-type="application/x-font-ttf"/></manifest>"#,
    )
}

#[test]
fn clean_epub_prints_json_report() {
    let path = write_epub("clean", &epub_with_opf(CONTENT_OPF));
    let output = run_cli(&["--pretty"], &path);
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["package_path"], "OEBPS/content.opf");
    assert_eq!(value["document"]["identity"]["version"], "3.0");
    assert_eq!(value["document"]["spine"]["primary"][0]["idref"], "chap1");
}

#[test]
fn stage_failure_exits_with_code_one_and_error_line() {
    let opf = CONTENT_OPF.replace("unique-identifier=\"BookId\"", "unique-identifier=\"BookId2\"");
    let path = write_epub("bookid2", &epub_with_opf(&opf));
    let output = run_cli(&[], &path);
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let lines = stderr_lines(&output);
    assert!(
        lines
            .iter()
            .any(|l| l.starts_with("error[metadata/ReferenceNotFoundError]: ")),
        "stderr: {:?}",
        lines
    );
}

#[test]
fn unreadable_path_reports_archive_stage() {
    let path = std::env::temp_dir().join("epub-inspect-cli-does-not-exist.epub");
    let output = run_cli(&[], &path);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_lines(&output)
        .iter()
        .any(|l| l.starts_with("error[archive/ArchiveError]: ")));
}

#[test]
fn advisories_pass_unless_strict() {
    let path = write_epub("advisory", &epub_with_opf(&deprecated_font_opf()));

    let lenient = run_cli(&[], &path);
    assert!(lenient.status.success());
    let value: serde_json::Value = serde_json::from_slice(&lenient.stdout).unwrap();
    assert_eq!(value["advisories"][0]["code"], "MANIFEST_MEDIA_TYPE_DEPRECATED");

    let strict = run_cli(&["--strict"], &path);
    std::fs::remove_file(&path).ok();

    assert_eq!(strict.status.code(), Some(1));
    // the report is still printed before the strict check fails
    assert!(!strict.stdout.is_empty());
    assert!(stderr_lines(&strict)
        .iter()
        .any(|l| l.starts_with("error[strict]: 1 advisories")));
}
