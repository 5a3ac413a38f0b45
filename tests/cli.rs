//! End-to-end tests for the `imagesearch` binary.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use image::{ImageBuffer, Luma};
use predicates::prelude::*;
use std::path::Path;
use std::process::{Command, Output};

fn imagesearch(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_imagesearch"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

fn write_gradient(path: &Path, inverted: bool) {
    ImageBuffer::from_fn(64, 48, |x, _| {
        let v = (x * 4) as u8;
        Luma([if inverted { 255 - v } else { v }])
    })
    .save(path)
    .unwrap();
}

/// ref.png, photos/{a.png, b.png (inverted), c.png (copy of a)}
fn photos() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_gradient(temp.child("ref.png").path(), false);
    temp.child("photos").create_dir_all().unwrap();
    write_gradient(temp.child("photos/a.png").path(), false);
    write_gradient(temp.child("photos/b.png").path(), true);
    write_gradient(temp.child("photos/c.png").path(), false);
    temp
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn search_prints_json_by_default() {
    let temp = photos();
    let output = imagesearch(&[
        "search",
        arg(temp.child("ref.png").path()),
        arg(temp.child("photos").path()),
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
    let rows: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["distance"], 0);
    assert_eq!(rows[1]["distance"], 0);
    assert!(rows[0]["path"].as_str().unwrap().ends_with("a.png"));
    assert!(rows[1]["path"].as_str().unwrap().ends_with("c.png"));
    assert!(rows[2]["path"].as_str().unwrap().ends_with("b.png"));
}

#[test]
fn compare_alias_with_text_format_and_threshold() {
    let temp = photos();
    let output = imagesearch(&[
        "compare",
        arg(temp.child("ref.png").path()),
        arg(temp.child("photos").path()),
        "--format",
        "text",
        "--threshold",
        "0",
    ]);

    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(predicate::str::starts_with("0\t").eval(lines[0]));
    assert!(predicate::str::ends_with("a.png").eval(lines[0]));
    assert!(predicate::str::ends_with("c.png").eval(lines[1]));
}

#[test]
fn stop_on_first_match_prints_one_row() {
    let temp = photos();
    let output = imagesearch(&[
        "search",
        "-1",
        "-f",
        "text",
        arg(temp.child("ref.png").path()),
        arg(temp.child("photos").path()),
    ]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 1);
}

#[test]
fn dupe_text_lists_group_members() {
    let temp = photos();
    let output = imagesearch(&[
        "dupe",
        "--algorithm",
        "dhash",
        "--format",
        "text",
        arg(temp.path()),
    ]);

    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(predicate::str::is_match("^[0-9a-f]+$").unwrap().eval(lines[0]));
    assert!(predicate::str::starts_with("  ").eval(lines[1]));
    assert!(lines[1].ends_with("a.png"));
    assert!(lines[2].ends_with("c.png"));
    assert!(lines[3].ends_with("ref.png"));
}

#[test]
fn dupe_json_with_algorithm_params() {
    let temp = photos();
    let output = imagesearch(&[
        "dupe",
        "-a",
        "phash",
        "-p",
        "hash_size=16",
        arg(temp.child("photos").path()),
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
    let groups: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["fingerprint"].as_str().unwrap().len(), 64);
    assert_eq!(groups[0]["paths"].as_array().unwrap().len(), 2);
}

#[test]
fn missing_reference_exits_with_one() {
    let temp = photos();
    let output = imagesearch(&[
        "search",
        arg(temp.child("nope.png").path()),
        arg(temp.child("photos").path()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(predicate::str::contains("error:").eval(&stderr(&output)));
}

#[test]
fn unknown_parameter_exits_with_one() {
    let temp = photos();
    let output = imagesearch(&[
        "dupe",
        "-a",
        "ahash",
        "-p",
        "binbits=3",
        arg(temp.path()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(predicate::str::contains("binbits").eval(&stderr(&output)));
}

#[test]
fn oversized_hash_size_exits_with_one() {
    let temp = photos();
    let output = imagesearch(&[
        "dupe",
        "-a",
        "phash",
        "-p",
        "hash_size=65536,highfreq_factor=65536",
        arg(temp.path()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(predicate::str::contains("hash_size").eval(&stderr(&output)));
}

#[test]
fn unknown_algorithm_is_a_usage_error() {
    let temp = photos();
    let output = imagesearch(&["dupe", "-a", "md5", arg(temp.path())]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn zero_jobs_is_rejected() {
    let temp = photos();
    let output = imagesearch(&["dupe", "-j", "0", arg(temp.path())]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_search_path_is_reported_not_fatal() {
    let temp = photos();
    let output = imagesearch(&[
        "search",
        "-f",
        "text",
        arg(temp.child("ref.png").path()),
        arg(temp.child("gone").path()),
        arg(temp.child("photos/a.png").path()),
    ]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).lines().count(), 1);
    assert!(predicate::str::contains("skipped 1 path").eval(&stderr(&output)));
    assert!(predicate::str::contains("1 named explicitly").eval(&stderr(&output)));
}

#[test]
fn algorithms_lists_names_and_parameters() {
    let output = imagesearch(&["algorithms"]);

    assert!(output.status.success());
    let text = stdout(&output);
    for name in [
        "ahash",
        "phash",
        "phash-simple",
        "dhash",
        "dhash-vert",
        "whash-haar",
        "whash-db4",
        "colorhash",
    ] {
        assert!(text.contains(name), "missing {}", name);
    }
    assert!(predicate::str::contains("binbits=3").eval(&text));
    assert!(predicate::str::contains("highfreq_factor=4").eval(&text));
}
