use std::path::PathBuf;
use std::process::Command;

// ── helpers ──────────────────────────────────────────────────────────────────

fn pyflyby_bin() -> PathBuf {
    // CARGO_BIN_EXE_pyflyby is set by cargo test for integration tests
    PathBuf::from(env!("CARGO_BIN_EXE_pyflyby"))
}

struct TempPy {
    dir: tempfile::TempDir,
    files: Vec<PathBuf>,
}

impl TempPy {
    fn new() -> Self {
        Self {
            dir: tempfile::TempDir::new().unwrap(),
            files: Vec::new(),
        }
    }

    fn file(&mut self, name: &str, content: &str) -> &mut Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        self.files.push(path);
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Run `pyflyby <verb> <extra...> <files...>`. Returns (stdout, stderr, exit_code).
    fn run(&self, verb: &str, extra: &[&str]) -> (String, String, i32) {
        let mut cmd = Command::new(pyflyby_bin());
        cmd.arg(verb);
        for a in extra {
            cmd.arg(a);
        }
        for f in &self.files {
            cmd.arg(f);
        }
        let out = cmd.output().expect("failed to run pyflyby");
        (
            String::from_utf8_lossy(&out.stdout).into_owned(),
            String::from_utf8_lossy(&out.stderr).into_owned(),
            out.status.code().unwrap_or(-1),
        )
    }

    fn contents(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap()
    }
}

fn run_stdin(verb: &str, extra: &[&str], input: &str) -> (String, String, i32) {
    use std::io::Write;
    let mut cmd = Command::new(pyflyby_bin());
    cmd.arg(verb);
    for a in extra {
        cmd.arg(a);
    }
    cmd.arg("-");
    cmd.stdin(std::process::Stdio::piped());
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    let mut child = cmd.spawn().expect("failed to run pyflyby");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
        out.status.code().unwrap_or(-1),
    )
}

// ── no-arguments banner ───────────────────────────────────────────────────────

#[test]
fn test_no_args_shows_banner_and_exits_zero() {
    let out = Command::new(pyflyby_bin()).output().expect("failed to run pyflyby");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("pyflyby"));
    assert!(stdout.to_lowercase().contains("verbs") || stdout.contains("Usage"));
}

// ── reformat ──────────────────────────────────────────────────────────────────

#[test]
fn test_reformat_sorts_plain_imports_one_per_line_and_writes() {
    let mut t = TempPy::new();
    t.file("a.py", "import sys\nimport os\n\nprint(os.getcwd(), sys.argv)\n");
    let (_, _, code) = t.run("reformat", &["--write"]);
    assert_eq!(code, 0);
    let contents = t.contents("a.py");
    assert!(contents.starts_with("import os\nimport sys\n"));
}

#[test]
fn test_reformat_without_write_prints_diff_and_leaves_file_untouched() {
    let mut t = TempPy::new();
    t.file("a.py", "import sys\nimport os\n\nprint(os.getcwd(), sys.argv)\n");
    let before = t.contents("a.py");
    let (stdout, _, _) = t.run("reformat", &[]);
    assert!(stdout.contains("import os"));
    assert!(stdout.contains("import sys"));
    assert_eq!(t.contents("a.py"), before);
}

// ── tidy ──────────────────────────────────────────────────────────────────────

#[test]
fn test_tidy_drops_unused_import() {
    let mut t = TempPy::new();
    t.file("a.py", "import os, sys\nprint(os.getcwd())\n");
    let (_, _, code) = t.run("tidy", &["--write"]);
    assert_eq!(code, 0);
    let contents = t.contents("a.py");
    assert!(contents.contains("import os"));
    assert!(!contents.contains("sys"));
}

#[test]
fn test_tidy_resolves_missing_name_from_db() {
    let mut t = TempPy::new();
    t.file("a.py", "re.search('[a-z]+', 'hello')\n");
    let dbdir = tempfile::TempDir::new().unwrap();
    std::fs::write(dbdir.path().join("known.py"), "import re\n").unwrap();
    let (_, _, code) = t.run("tidy", &["--write", "--db", &dbdir.path().display().to_string()]);
    assert_eq!(code, 0);
    assert!(t.contents("a.py").starts_with("import re\n"));
}

#[test]
fn test_tidy_ambiguous_name_exits_100_and_leaves_name_missing() {
    let mut t = TempPy::new();
    t.file("a.py", "arange(10)\n");
    let dbdir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dbdir.path().join("known.py"),
        "from numpy import arange\nfrom dask.array import arange\n",
    )
    .unwrap();
    let (_, stderr, code) = t.run("tidy", &["--write", "--db", &dbdir.path().display().to_string()]);
    assert_eq!(code, 100);
    assert!(stderr.to_lowercase().contains("ambiguous"));
    assert!(!t.contents("a.py").contains("import"));
}

#[test]
fn test_tidy_respects_noqa_retention() {
    let mut t = TempPy::new();
    t.file("a.py", "import os  # noqa\nprint('hi')\n");
    t.run("tidy", &["--write"]);
    assert!(t.contents("a.py").contains("import os"));
}

#[test]
fn test_tidy_json_diagnostics_shape() {
    let mut t = TempPy::new();
    t.file("a.py", "arange(10)\n");
    let (stdout, _, _) = t.run("tidy", &["--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert!(parsed.is_array());
    let first = &parsed[0];
    assert!(first.get("message").is_some());
    assert!(first.get("severity").is_some());
}

// ── transform / canonicalize ──────────────────────────────────────────────────

#[test]
fn test_transform_rewrites_prefix_preserving_bound_name() {
    let mut t = TempPy::new();
    t.file("a.py", "import numpy\nnumpy.arange(3)\n");
    let (_, _, code) = t.run("transform", &["--write", "--map", "numpy=numpy2"]);
    assert_eq!(code, 0);
    assert!(t.contents("a.py").starts_with("import numpy2 as numpy\n"));
}

#[test]
fn test_transform_rejects_malformed_map_entry() {
    let mut t = TempPy::new();
    t.file("a.py", "import os\n");
    let (_, _, code) = t.run("transform", &["--write", "--map", "nonsense"]);
    assert_eq!(code, 2);
}

// ── replace-star / remove-broken (null probe) ────────────────────────────────

#[test]
fn test_replace_star_with_null_probe_leaves_star_and_emits_diagnostic() {
    let mut t = TempPy::new();
    // Blank line already separates the prologue from the body, so an
    // unresolved star import is a true no-op: text is byte-identical, only
    // a diagnostic is emitted.
    t.file("a.py", "from foo import *\n\nfoo_thing()\n");
    let (_, stderr, code) = t.run("replace-star", &[]);
    assert_eq!(code, 100);
    assert!(stderr.to_lowercase().contains("probe"));
}

#[test]
fn test_remove_broken_with_null_probe_drops_everything_unmarked() {
    let mut t = TempPy::new();
    t.file("a.py", "import os\nimport sys  # noqa\n");
    t.run("remove-broken", &["--write"]);
    let contents = t.contents("a.py");
    assert!(!contents.contains("import os"));
    assert!(contents.contains("import sys"));
}

// ── collect ───────────────────────────────────────────────────────────────────

#[test]
fn test_collect_runs_verb_across_files_independently() {
    let mut t = TempPy::new();
    t.file("a.py", "import sys\nimport os\nos.getcwd()\n");
    t.file("b.py", "def f(\n"); // unclosed paren: parse error must not abort the batch
    let (_, stderr, code) = t.run("collect", &["reformat", "--write"]);
    assert_eq!(code, 1, "one file's parse error should make the batch report fatal");
    assert!(!stderr.is_empty());
    assert!(t.contents("a.py").contains("import os") && t.contents("a.py").contains("import sys"));
}

#[test]
fn test_collect_unknown_verb_is_usage_error() {
    let mut t = TempPy::new();
    t.file("a.py", "import os\n");
    let (_, _, code) = t.run("collect", &["bogus-verb"]);
    assert_eq!(code, 2);
}

// ── stdin ─────────────────────────────────────────────────────────────────────

#[test]
fn test_tidy_reads_from_stdin_and_writes_to_stdout() {
    let (stdout, _, code) = run_stdin("tidy", &[], "import os, sys\nprint(os.getcwd())\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("import os"));
    assert!(!stdout.contains("sys"));
}

#[test]
fn test_tidy_stdin_json_includes_rewritten_text() {
    let (stdout, _, _) = run_stdin("tidy", &["--json"], "import os, sys\nprint(os.getcwd())\n");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert!(parsed["text"].as_str().unwrap().contains("import os"));
    assert_eq!(parsed["changed"], true);
}

// ── directory scanning ────────────────────────────────────────────────────────

#[test]
fn test_tidy_scans_directory_recursively() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.py"), "import os, sys\nprint(os.getcwd())\n").unwrap();
    let sub = dir.path().join("pkg");
    std::fs::create_dir_all(&sub).unwrap();
    std::fs::write(sub.join("b.py"), "import re\nre.compile('x')\n").unwrap();

    let out = Command::new(pyflyby_bin())
        .arg("tidy")
        .arg("--write")
        .arg(dir.path())
        .output()
        .expect("failed to run pyflyby");
    assert!(out.status.success());
    assert!(!std::fs::read_to_string(dir.path().join("a.py")).unwrap().contains("sys"));
}
