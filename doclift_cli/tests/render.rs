mod common;

use clap::Parser;
use doclift_cli::Commands;
use doclift_cli::DocliftCli;
use doclift_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn render_prints_canonical_page() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "docs/page.md", "!!! note\n    Hello\n")?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("::: note\nHello\n:::\n");

	// Rendering only prints; the page on disk is untouched.
	assert_eq!(std::fs::read_to_string(&page)?, "!!! note\n    Hello\n");

	Ok(())
}

#[test]
fn render_skips_named_stages() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "docs/page.md", "!!! note\n    Hello\n")?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.arg("--skip")
		.arg("admonitions")
		.assert()
		.success()
		.stdout("!!! note\n    Hello\n");

	Ok(())
}

#[test]
fn render_warns_about_unknown_stages() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "docs/page.md", "!!! note\n    Hello\n")?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.arg("--skip")
		.arg("no-such-stage")
		.assert()
		.success()
		.stdout("::: note\nHello\n:::\n")
		.stderr(predicates::str::contains("unknown render stage"));

	Ok(())
}

#[test]
fn render_substitutes_versions_and_variables() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"docs/.vitepress/variables/ktorVer.json",
		r#"{ "versions": { "ktor": "3.1.0" } }"#,
	)?;
	common::write(
		tmp.path(),
		"docs/.vitepress/variables/ktor.v.list",
		"<vars>\n    <var name=\"port\" value=\"8080\"/>\n</vars>\n",
	)?;
	let page = common::write(tmp.path(), "docs/ktor/server.md", "Ktor {{ versions.ktor }} on %port%\n")?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.arg("--doc-type")
		.arg("ktor")
		.assert()
		.success()
		.stdout("Ktor 3.1.0 on 8080\n");

	Ok(())
}

#[test]
fn render_uses_configured_variables_dir() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "doclift.toml", "[site]\nvariables_dir = \"vars\"\n")?;
	common::write(
		tmp.path(),
		"vars/koogVer.json",
		r#"{ "versions": { "koog": "0.4.1" } }"#,
	)?;
	let page = common::write(tmp.path(), "docs/koog/index.md", "Koog {{ versions.koog }}\n")?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.arg("--doc-type")
		.arg("koog")
		.assert()
		.success()
		.stdout("Koog 0.4.1\n");

	Ok(())
}

#[test]
fn render_titles_writerside_pages_from_front_matter() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"doclift.toml",
		"[[repos]]\nname = \"kmp\"\npath = \"kmp-repo\"\n\n[repos.strategy]\nkind = \"writerside\"\n",
	)?;
	let page = common::write(
		tmp.path(),
		"docs/kmp/intro.md",
		"---\ntitle: Get started\n---\n\n<video src=\"https://youtu.be/x\"/>\n\n![Shot](images/shot.png)\n",
	)?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.arg("--doc-type")
		.arg("kmp")
		.assert()
		.success()
		.stdout("# Get started\n\n<YouTubeVideo src=\"https://youtu.be/x\"/>\n\n![Shot](/images/shot.png)\n");

	Ok(())
}

#[test]
fn render_check_passes_for_canonical_pages() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "docs/page.md", "# Title\n\nPlain text.\n")?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.arg("--check")
		.assert()
		.success()
		.stdout(predicates::str::contains("is up to date"));

	Ok(())
}

#[test]
fn render_check_fails_with_diff() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = common::write(tmp.path(), "docs/page.md", "!!! note\n    Hello\n")?;

	common::doclift_cmd()
		.arg("render")
		.arg(&page)
		.arg("--path")
		.arg(tmp.path())
		.arg("--check")
		.assert()
		.code(1)
		.stdout(predicates::str::is_empty())
		.stderr(
			predicates::str::contains("would change")
				.and(predicates::str::contains("-!!! note"))
				.and(predicates::str::contains("+::: note")),
		);

	Ok(())
}

#[test]
fn render_missing_file_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::doclift_cmd()
		.arg("render")
		.arg(tmp.path().join("missing.md"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2);

	Ok(())
}

#[test]
fn stages_lists_render_order() {
	common::doclift_cmd()
		.arg("stages")
		.assert()
		.success()
		.stdout(
			predicates::str::starts_with("liquid-conditions\nliquid-includes\n")
				.and(predicates::str::contains("exercises\ncode-attributes\nadmonitions\n"))
				.and(predicates::str::contains("frontmatter-title\nauto-title\n"))
				.and(predicates::str::contains("content-tabs\ndiff-titles\nhl-lines\n"))
				.and(predicates::str::ends_with("topic-variables\nimage-sources\nvideo-tags\nscripts\n")),
		);
}

#[test]
fn no_subcommand_exits_with_usage_hint() {
	common::doclift_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("doclift --help"));
}

#[test]
fn parses_repeated_skip_flags() {
	let cli = DocliftCli::parse_from([
		"doclift",
		"render",
		"page.md",
		"--doc-type",
		"ktor",
		"--skip",
		"admonitions",
		"--skip",
		"scripts",
	]);

	let Some(Commands::Render {
		doc_type,
		skip,
		check,
		..
	}) = cli.command
	else {
		panic!("expected render command");
	};
	assert_eq!(doc_type.as_deref(), Some("ktor"));
	assert_eq!(skip, vec!["admonitions".to_string(), "scripts".to_string()]);
	assert!(!check);
}

#[test]
fn global_flags_follow_the_subcommand() {
	let cli = DocliftCli::parse_from(["doclift", "stages", "--path", "site", "-v", "--no-color"]);

	assert_eq!(cli.path.as_deref(), Some(std::path::Path::new("site")));
	assert!(cli.verbose);
	assert!(cli.no_color);
	assert!(matches!(cli.command, Some(Commands::Stages)));
}
