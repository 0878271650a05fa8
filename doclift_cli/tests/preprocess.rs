mod common;

use clap::Parser;
use doclift_cli::Commands;
use doclift_cli::DocliftCli;
use doclift_core::AnyEmptyResult;
use doclift_core::PreprocessMode;

const FOO_TOPIC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<topic title="Foo Page" id="foo">
    <card-summary>
        Does foo things
    </card-summary>
</topic>
"#;

#[test]
fn preprocess_exports_topics_with_project_lookups() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "ktor-repo/docs/foo.topic", FOO_TOPIC)?;
	let index = common::write(
		tmp.path(),
		"ktor-repo/docs/index.topic",
		"<topic id=\"index\">\n<card href=\"foo.topic\"/>\n</topic>",
	)?;

	common::doclift_cmd()
		.arg("preprocess")
		.arg(&index)
		.arg("--project")
		.arg("ktor")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			"<topic id=\"index\">\n<card href=\"/ktor/foo\" summary=\"Does foo things\">Foo Page</card>\n</topic>",
		);

	Ok(())
}

#[test]
fn preprocess_markdown_mode_skips_topic_transform() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "page.md", "[[[A|a.md]]] <path>x</path>")?;

	common::doclift_cmd()
		.arg("preprocess")
		.arg(&page)
		.arg("--project")
		.arg("ktor")
		.arg("--mode")
		.arg("markdown")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("A <path>x</path>");

	Ok(())
}

#[test]
fn preprocess_both_mode_wraps_paths() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "page.md", "[[[A|a.md]]] <path>x</path>")?;

	common::doclift_cmd()
		.arg("preprocess")
		.arg(&page)
		.arg("--project")
		.arg("ktor")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("A <Path>x</Path>");

	Ok(())
}

#[test]
fn preprocess_check_passes_in_none_mode() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "page.md", "[[[A|a.md]]]\n")?;

	common::doclift_cmd()
		.arg("preprocess")
		.arg(&page)
		.arg("--project")
		.arg("ktor")
		.arg("--mode")
		.arg("none")
		.arg("--check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("is up to date"));

	Ok(())
}

#[test]
fn preprocess_check_fails_when_document_changes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "page.md", "[[[A|a.md]]]\n")?;

	common::doclift_cmd()
		.arg("preprocess")
		.arg(&page)
		.arg("--project")
		.arg("ktor")
		.arg("--check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("would change"));

	Ok(())
}

#[test]
fn preprocess_rejects_unknown_mode() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "page.md", "text")?;

	common::doclift_cmd()
		.arg("preprocess")
		.arg(&page)
		.arg("--project")
		.arg("ktor")
		.arg("--mode")
		.arg("bogus")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("bogus"));

	Ok(())
}

#[test]
fn preprocess_requires_a_project() {
	let result = DocliftCli::try_parse_from(["doclift", "preprocess", "page.md"]);

	assert!(result.is_err());
}

#[test]
fn preprocess_mode_defaults_to_both() {
	let cli = DocliftCli::parse_from(["doclift", "preprocess", "page.md", "--project", "ktor"]);

	let Some(Commands::Preprocess { mode, project, .. }) = cli.command else {
		panic!("expected preprocess command");
	};
	assert_eq!(mode, PreprocessMode::Both);
	assert_eq!(project, "ktor");
}
