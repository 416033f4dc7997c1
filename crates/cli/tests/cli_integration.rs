use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir, tempdir};

const TEMPLATE: &str = "\\documentclass{article}
\\usepackage{tabularx}
\\begin{document}
% === BEGIN MARKDOWN CONTENT ===
old content
% === END MARKDOWN CONTENT ===
\\end{document}
";

const RAW: &str = "\\section{Results}\\label{my-notes--results}

{[}{[}loss\\_curve.png{]}{]}
Figure 1: Training loss

As {[}{[}loss\\_curve.png{]}{]} shows, see {[}{[}\\#Results{]}{]}.

Table scores: Scores per model

\\begin{longtable}[]{@{}ll@{}}
\\toprule\\noalign{}
Model & Score \\\\
\\midrule\\noalign{}
\\endhead
\\bottomrule\\noalign{}
\\endlastfoot
A & 1 \\\\
\\end{longtable}

Table scores lists them.
";

struct Project {
    dir: TempDir,
}

impl Project {
    fn new(sources: &[&str]) -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("input")).unwrap();
        for name in sources {
            fs::write(dir.path().join("input").join(name), "# Notes\n").unwrap();
        }
        fs::write(dir.path().join("raw.tex"), RAW).unwrap();
        fs::write(dir.path().join("main.tex"), TEMPLATE).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn convert(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("notetex");
        cmd.arg("convert")
            .arg("--source-dir")
            .arg(self.path("input"))
            .arg("--raw")
            .arg(self.path("raw.tex"))
            .arg("--template")
            .arg(self.path("main.tex"));
        cmd
    }

    fn template(&self) -> String {
        fs::read_to_string(self.path("main.tex")).unwrap()
    }
}

#[test]
fn help_lists_commands() {
    cargo_bin_cmd!("notetex")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("copy-figures"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("process"));
}

#[test]
fn convert_splices_processed_body() {
    let project = Project::new(&["My Notes.md"]);
    project
        .convert()
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"));

    let template = project.template();
    assert!(template.starts_with("\\documentclass{article}\n\\usepackage{tabularx}\n"));
    assert!(template.ends_with("% === END MARKDOWN CONTENT ===\n\\end{document}\n"));
    assert!(!template.contains("old content"));
    assert!(template.contains("\\includegraphics[width=\\textwidth]{figures/loss_curve.png}"));
    assert!(template.contains("\\caption{Training loss}"));
    assert!(template.contains("As Figure~\\ref{fig:loss-curve} shows"));
    assert!(template.contains("\\hyperref[my-notes--results]{Results}"));
    assert!(template.contains("\\label{tbl:scores}"));
    assert!(template.contains("Table~\\ref{tbl:scores} lists them."));
    assert!(!template.contains("\\begin{longtable}"));
}

#[test]
fn convert_twice_gives_the_same_template() {
    let project = Project::new(&["notes.md"]);
    project.convert().assert().success();
    let once = project.template();
    project.convert().assert().success();
    assert_eq!(project.template(), once);
}

#[test]
fn no_source_document_fails_without_writing() {
    let project = Project::new(&[]);
    project
        .convert()
        .assert()
        .failure()
        .stderr(predicate::str::contains("No source document"));
    assert_eq!(project.template(), TEMPLATE);
}

#[test]
fn two_source_documents_fail_and_are_listed() {
    let project = Project::new(&["a.md", "b.md"]);
    project
        .convert()
        .assert()
        .failure()
        .stderr(predicate::str::contains("found 2"))
        .stderr(predicate::str::contains("a.md"))
        .stderr(predicate::str::contains("b.md"));
    assert_eq!(project.template(), TEMPLATE);
}

#[test]
fn template_without_markers_is_left_alone() {
    let project = Project::new(&["notes.md"]);
    fs::write(project.path("main.tex"), "\\begin{document}\n\\end{document}\n").unwrap();
    project
        .convert()
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing injection marker"));
    assert_eq!(project.template(), "\\begin{document}\n\\end{document}\n");
}

#[test]
fn missing_raw_file_fails() {
    let project = Project::new(&["notes.md"]);
    fs::remove_file(project.path("raw.tex")).unwrap();
    project
        .convert()
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    assert_eq!(project.template(), TEMPLATE);
}

#[test]
fn report_lists_warnings() {
    let project = Project::new(&["notes.md"]);
    fs::write(project.path("raw.tex"), "See Figure~\\ref{fig:nowhere}.\n").unwrap();
    let report = project.path("report.json");
    project.convert().arg("--report").arg(&report).assert().success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    let warnings = json["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["kind"], "unresolved-reference");
    assert_eq!(warnings[0]["reference"], "figure");
    assert_eq!(warnings[0]["key"], "fig:nowhere");
}

#[test]
fn missing_assets_are_reported() {
    let project = Project::new(&["notes.md"]);
    fs::create_dir(project.path("figures")).unwrap();
    let report = project.path("report.json");
    project
        .convert()
        .arg("--assets")
        .arg(project.path("figures"))
        .arg("--report")
        .arg(&report)
        .assert()
        .success();
    let report = fs::read_to_string(&report).unwrap();
    assert!(report.contains("missing-asset"), "{report}");
    assert!(report.contains("figures/loss_curve.png"), "{report}");
}

#[test]
fn copy_figures_flattens_images() {
    let dir = tempdir().unwrap();
    let from = dir.path().join("input");
    fs::create_dir_all(from.join("attachments")).unwrap();
    fs::write(from.join("attachments/error curve.png"), b"png").unwrap();
    fs::write(from.join("notes.md"), "# x").unwrap();
    let to = dir.path().join("paper/figures");

    cargo_bin_cmd!("notetex")
        .arg("copy-figures")
        .arg("--from")
        .arg(&from)
        .arg("--to")
        .arg(&to)
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied 1 figure(s)"));
    assert!(to.join("error_curve.png").is_file());
    assert!(!to.join("notes.md").exists());
}

#[test]
fn process_writes_stdout() {
    let input = NamedTempFile::new().unwrap();
    fs::write(input.path(), "a → b\n").unwrap();
    cargo_bin_cmd!("notetex")
        .arg("process")
        .arg(input.path())
        .assert()
        .success()
        .stdout("a \\ensuremath{\\to} b\n");
}

#[test]
fn process_honours_config() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("raw.tex");
    let output = dir.path().join("out.tex");
    fs::write(&input, "a → b\n").unwrap();
    let config = write_temp_config("unicode_arrows: false\n");

    cargo_bin_cmd!("notetex")
        .arg("process")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--config")
        .arg(config.path())
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&output).unwrap(), "a → b\n");
}

#[test]
fn invalid_config_fails() {
    let project = Project::new(&["notes.md"]);
    let config = write_temp_config("no_such_option: true\n");
    project
        .convert()
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
    assert_eq!(project.template(), TEMPLATE);
}

fn write_temp_config(contents: &str) -> NamedTempFile {
    let config = NamedTempFile::new().unwrap();
    fs::write(config.path(), contents).unwrap();
    config
}

#[test]
fn options_without_config_use_default() {
    let options = notetex::config::load_options(None::<&Path>).unwrap();
    assert_eq!(options, notetex_core::Options::default());
}

#[test]
fn options_override_only_given_fields() {
    let config = write_temp_config("landscape_threshold: 7\nbare_note_policy: plain-text\n");
    let options = notetex::config::load_options(Some(config.path())).unwrap();
    let expected = notetex_core::Options {
        landscape_threshold: 7,
        bare_note_policy: notetex_core::BareNotePolicy::PlainText,
        ..Default::default()
    };
    assert_eq!(options, expected);
}

#[test]
fn options_reject_bad_values() {
    for invalid in ["landscape_threshold: many\n", "bare_note_policy: sometimes\n", "x: [1\n"] {
        let config = write_temp_config(invalid);
        assert!(
            notetex::config::load_options(Some(config.path())).is_err(),
            "should be rejected: {invalid}"
        );
    }
}

#[test]
fn options_reject_missing_file() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");
    assert!(notetex::config::load_options(Some(missing.as_path())).is_err());
}
