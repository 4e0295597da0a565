use assert_fs::prelude::*;
use repo2txt::{Config, OptimizationLevel, OutputFormat, Pipeline, run};
use std::fs;

fn read(path: &std::path::Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn python_file_with_default_config() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("repo");
    repo.child("main.py")
        .write_str("def f():\n    \"\"\"doc\"\"\"\n    # comment\n    return 1\n\n\n")
        .unwrap();
    let output = temp.child("out.txt");

    let config = Config::builder()
        .root_dir(repo.path())
        .output(output.path())
        .build()
        .unwrap();
    let stats = run(config).unwrap();

    assert_eq!(stats.files, 1);
    let text = read(output.path());
    assert_eq!(
        text,
        "=== main.py (python) ===\ndef f():\n \"\"\"doc\"\"\"\n return 1\n\n"
    );
    assert!(!text.contains("# comment"));
    assert!(!text.contains("\n\n\n"));
}

#[test]
fn output_is_deterministic() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("repo");
    repo.child("src/lib.rs").write_str("pub mod a;\npub mod b;\n").unwrap();
    repo.child("src/a.rs").write_str("pub fn a() -> u8 {\n    1\n}\n").unwrap();
    repo.child("src/b.rs").write_str("pub fn b() -> u8 {\n    2\n}\n").unwrap();
    repo.child("web/index.html").write_str("<div>\n  <p>x</p>\n</div>\n").unwrap();
    repo.child("Cargo.toml").write_str("[package]\nname = \"demo\"\n").unwrap();
    repo.child("Cargo.lock").write_str("# generated\n").unwrap();

    let run_once = |name: &str| {
        let output = temp.child(name);
        let config = Config::builder()
            .root_dir(repo.path())
            .output(output.path())
            .format(OutputFormat::Markdown)
            .build()
            .unwrap();
        Pipeline::new(config).unwrap().run().unwrap();
        read(output.path())
    };

    let first = run_once("first.md");
    let second = run_once("second.md");
    assert_eq!(first, second);

    let order: Vec<_> = first
        .lines()
        .filter_map(|l| l.strip_prefix("## File: "))
        .collect();
    assert_eq!(
        order,
        vec!["Cargo.toml", "src/a.rs", "src/b.rs", "src/lib.rs", "web/index.html"]
    );
}

#[test]
fn chunks_respect_limit() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("repo");
    for i in 0..6 {
        repo.child(format!("mod{i}.txt"))
            .write_str(&format!("file number {i}\n").repeat(4))
            .unwrap();
    }
    repo.child("big.txt").write_str(&"x".repeat(500)).unwrap();

    let config = Config::builder()
        .root_dir(repo.path())
        .output(temp.child("out/context.txt").path())
        .chunk_size(200)
        .build()
        .unwrap();
    let stats = run(config).unwrap();

    assert!(stats.chunks > 1);
    assert_eq!(stats.files_written, stats.chunks);

    let mut entries = 0;
    for n in 1..=stats.chunks {
        let text = read(temp.child(format!("out/context_{n}.txt")).path());
        let count = text.matches("=== ").count();
        entries += count;
        assert!(text.len() <= 200 || count == 1, "chunk {n} is {} bytes", text.len());
    }
    assert_eq!(entries, 7);
}

#[test]
fn filters_apply_in_order() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("repo");
    repo.child("keep.py").write_str("x = 1\n").unwrap();
    repo.child("drop.js").write_str("var x = 1;\n").unwrap();
    repo.child("node_modules/pkg/index.py").write_str("y = 2\n").unwrap();
    repo.child("a/test/t.py").write_str("z = 3\n").unwrap();
    repo.child("atest/t.py").write_str("w = 4\n").unwrap();
    repo.child("blob.py").write_binary(b"\x00\x01\x02").unwrap();

    let output = temp.child("out.txt");
    let config = Config::builder()
        .root_dir(repo.path())
        .output(output.path())
        .include_extensions(["py", ".JS"])
        .exclude_extensions(["js"])
        .ignore_patterns(["**/test/**"])
        .build()
        .unwrap();
    let stats = run(config).unwrap();

    let text = read(output.path());
    assert!(text.contains("=== keep.py (python) ==="));
    assert!(text.contains("=== atest/t.py (python) ==="));
    assert!(!text.contains("drop.js"));
    assert!(!text.contains("a/test/t.py"));
    assert!(!text.contains("node_modules"));
    assert!(!text.contains("blob.py"));
    assert_eq!(stats.files, 2);
    assert_eq!(stats.pruned_dirs, 2);
}

#[test]
fn aggressive_level_keeps_docstrings_only() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("repo");
    repo.child("lib.rs")
        .write_str("/// Adds one.\npub fn inc(x: u32) -> u32 {\n    x + 1 // bump\n}\n")
        .unwrap();

    let output = temp.child("out.txt");
    let config = Config::builder()
        .root_dir(repo.path())
        .output(output.path())
        .level(OptimizationLevel::Aggressive)
        .preserve_comments(true)
        .build()
        .unwrap();
    run(config).unwrap();

    let text = read(output.path());
    assert!(text.contains("/// Adds one.\n"));
    assert!(!text.contains("bump"));
}

#[test]
fn preamble_with_timestamp_lands_in_first_chunk() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("repo");
    repo.child("a.txt").write_str("alpha\n").unwrap();

    let output = temp.child("out.jsonl");
    let config = Config::builder()
        .root_dir(repo.path())
        .output(output.path())
        .format(OutputFormat::Jsonl)
        .timestamp(true)
        .build()
        .unwrap();
    run(config).unwrap();

    let text = read(output.path());
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["type"], "generated");
    assert_eq!(lines[1]["path"], "a.txt");
    assert_eq!(lines[1]["content"], "alpha\n");
}

#[test]
fn empty_tree_still_writes_output() {
    let temp = assert_fs::TempDir::new().unwrap();
    let repo = temp.child("repo");
    repo.create_dir_all().unwrap();

    let output = temp.child("out.txt");
    let config = Config::builder()
        .root_dir(repo.path())
        .output(output.path())
        .build()
        .unwrap();
    let stats = run(config).unwrap();

    assert_eq!(stats.files, 0);
    assert_eq!(stats.chunks, 1);
    output.assert("");
}
