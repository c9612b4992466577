use std::{
	fs,
	path::{Path, PathBuf},
	process::{Command, Output},
	time::{SystemTime, UNIX_EPOCH},
};

use serde_json::Value;

const VIOLATION: &str = "<?php\nfunction f() {\n  foo();\n  return 1;\n}\n";
const FIXED: &str = "<?php\nfunction f() {\n  foo();\n\n  return 1;\n}\n";

fn create_temp_root(name: &str) -> PathBuf {
	let stamp = SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock.").as_nanos();
	let root = std::env::temp_dir().join(format!("jumpline-{name}-{stamp}"));
	let _ = fs::remove_dir_all(&root);

	fs::create_dir_all(&root).expect("Create temp root.");

	root
}

fn jumpline(root: &Path, args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_jumpline"))
		.current_dir(root)
		.env_remove("RUST_LOG")
		.args(args)
		.output()
		.expect("run jumpline")
}

#[test]
fn check_reports_finding_and_fails() {
	let root = create_temp_root("check");

	fs::write(root.join("f.php"), VIOLATION).expect("write source");

	let output = jumpline(&root, &["check", "f.php"]);
	let stdout = String::from_utf8_lossy(&output.stdout);

	assert_eq!(output.status.code(), Some(1));
	assert!(stdout.contains(
		"f.php:4:3: [BlankLineBeforeJump] There must be a blank line before return statement \
		 (fixable)"
	));
	assert!(stdout.contains("Checked 1 file(s)."));
	assert_eq!(fs::read_to_string(root.join("f.php")).expect("read source"), VIOLATION);
}

#[test]
fn json_format_emits_one_record_per_finding() {
	let root = create_temp_root("json");

	fs::write(root.join("f.php"), VIOLATION).expect("write source");

	let output = jumpline(&root, &["check", "--format", "json", "f.php"]);
	let stdout = String::from_utf8_lossy(&output.stdout);
	let records = stdout
		.lines()
		.map(|line| serde_json::from_str::<Value>(line).expect("json line"))
		.collect::<Vec<_>>();

	assert_eq!(output.status.code(), Some(1));
	assert_eq!(records.len(), 1);
	assert_eq!(records[0]["file"], "f.php");
	assert_eq!(records[0]["line"], 4);
	assert_eq!(records[0]["column"], 3);
	assert_eq!(records[0]["rule"], "BlankLineBeforeJump");
	assert_eq!(records[0]["fixable"], true);
}

#[test]
fn fix_inserts_blank_line_and_rechecks_clean() {
	let root = create_temp_root("fix");

	fs::write(root.join("f.php"), VIOLATION).expect("write source");

	let output = jumpline(&root, &["fix", "f.php"]);
	let stdout = String::from_utf8_lossy(&output.stdout);

	assert!(output.status.success(), "fix should leave no findings: {stdout}");
	assert!(stdout.contains("Applied 1 fix(es)."));
	assert_eq!(fs::read_to_string(root.join("f.php")).expect("read source"), FIXED);

	let output = jumpline(&root, &["fix", "f.php"]);

	assert!(output.status.success());
	assert!(String::from_utf8_lossy(&output.stdout).contains("Applied 0 fix(es)."));
	assert_eq!(fs::read_to_string(root.join("f.php")).expect("read source"), FIXED);
}

#[test]
fn clean_file_passes() {
	let root = create_temp_root("clean");

	fs::write(root.join("f.php"), "<?php\nfunction f() {\n  return 1;\n}\n").expect("write source");

	let output = jumpline(&root, &["check", "f.php"]);

	assert!(output.status.success());
	assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Checked 1 file(s).");
}

#[test]
fn lex_error_is_reported_and_file_is_not_fixed() {
	let root = create_temp_root("lex");
	let source = "function f() {\n  foo();\n  return \"open;\n}\n";

	fs::write(root.join("broken.php"), source).expect("write source");

	let output = jumpline(&root, &["fix", "broken.php"]);
	let stdout = String::from_utf8_lossy(&output.stdout);

	assert_eq!(output.status.code(), Some(1));
	assert!(stdout.contains("broken.php:3:10: [LexError] unterminated string literal"));
	assert_eq!(fs::read_to_string(root.join("broken.php")).expect("read source"), source);
}

#[test]
fn git_tracked_files_are_filtered_by_extension() {
	let root = create_temp_root("git");

	fs::write(root.join("a.php"), VIOLATION).expect("write php");
	fs::write(root.join("b.inc"), VIOLATION).expect("write inc");
	fs::write(root.join("notes.txt"), VIOLATION).expect("write txt");

	let output = Command::new("git").current_dir(&root).args(["init"]).output().expect("git init");

	assert!(output.status.success());

	let output = Command::new("git")
		.current_dir(&root)
		.args(["add", "a.php", "b.inc", "notes.txt"])
		.output()
		.expect("git add");

	assert!(output.status.success());

	let output = jumpline(&root, &["check"]);
	let stdout = String::from_utf8_lossy(&output.stdout);

	assert_eq!(output.status.code(), Some(1));
	assert!(stdout.contains("a.php:4:3: [BlankLineBeforeJump]"));
	assert!(!stdout.contains("b.inc"));
	assert!(!stdout.contains("notes.txt"));
	assert!(stdout.contains("Checked 1 file(s)."));

	let output = jumpline(&root, &["check", "--extension", "inc", "--extension", "php"]);
	let stdout = String::from_utf8_lossy(&output.stdout);
	let a_line = stdout.find("a.php:4:3").expect("a.php finding");
	let b_line = stdout.find("b.inc:4:3").expect("b.inc finding");

	assert!(a_line < b_line);
	assert!(stdout.contains("Checked 2 file(s)."));
}

#[test]
fn unknown_rule_is_rejected() {
	let root = create_temp_root("rule");

	fs::write(root.join("f.php"), VIOLATION).expect("write source");

	let output = jumpline(&root, &["check", "--rule", "Nope", "f.php"]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown rule id(s): Nope."));
}

#[test]
fn rules_subcommand_lists_rule_ids() {
	let root = create_temp_root("rules");
	let output = jumpline(&root, &["rules"]);

	assert!(output.status.success());
	assert_eq!(String::from_utf8_lossy(&output.stdout), "BlankLineBeforeJump\timplemented\n");
}
