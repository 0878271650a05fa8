mod common;

use doclift_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

const MARKDOWN_CONFIG: &str = r#"
[[repos]]
name = "coil"
path = "coil-repo"
version_file = { src = "coil.v.list", dest = "docs/.vitepress/variables/coil.v.list" }
assets = { src = "images", dest = "docs/public/coil" }

[repos.strategy]
kind = "markdown"
extra_files = { "README.md" = "docs/overview.md" }
"#;

const WRITERSIDE_CONFIG: &str = r#"
[site]
locales = ["en", "zh"]

[[repos]]
name = "kotlin"
path = "kotlin-repo"

[repos.strategy]
kind = "writerside"
flatten_from = "docs/topics"
remove_topic_sources = true
"#;

const KOTLIN_TREE: &str = "<instance-profile id=\"kr\">
    <toc-element topic=\"home.topic\"/>
    <toc-element toc-title=\"Basics\">
        <toc-element topic=\"intro.md\"/>
    </toc-element>
</instance-profile>
";

fn markdown_site() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "doclift.toml", MARKDOWN_CONFIG)?;
	common::write(tmp.path(), "coil-repo/README.md", "# Coil\n")?;
	common::write(tmp.path(), "coil-repo/docs/index.md", "# Index\n")?;
	common::write(tmp.path(), "coil-repo/coil.v.list", "<vars/>\n")?;
	common::write(tmp.path(), "coil-repo/images/logos/coil.svg", "<svg/>")?;
	Ok(tmp)
}

fn writerside_site() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "doclift.toml", WRITERSIDE_CONFIG)?;
	common::write(tmp.path(), "kotlin-repo/docs/kr.tree", KOTLIN_TREE)?;
	common::write(
		tmp.path(),
		"kotlin-repo/docs/topics/basics/intro.md",
		"[//]: # (title: Intro)\n",
	)?;
	common::write(
		tmp.path(),
		"kotlin-repo/docs/topics/home.topic",
		"<topic title=\"Home\" id=\"home\">\n<p>Hi</p>\n</topic>\n",
	)?;
	Ok(tmp)
}

#[test]
fn sync_lists_documents_and_copies_root_files() -> AnyEmptyResult {
	let tmp = markdown_site()?;

	common::doclift_cmd()
		.arg("sync")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("coil\n  docs/overview.md\n  docs/index.md\n")
				.and(predicates::str::contains("Prepared 2 document(s) from 1 repository(ies).")),
		);

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("coil-repo/docs/overview.md"))?,
		"# Coil\n"
	);

	Ok(())
}

#[test]
fn sync_writerside_exports_topics_and_builds_sidebar() -> AnyEmptyResult {
	let tmp = writerside_site()?;

	common::doclift_cmd()
		.arg("sync")
		.arg("--repo")
		.arg("kotlin")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("  docs/intro.md\n  docs/home.md\n"));

	let docs = tmp.path().join("kotlin-repo/docs");
	assert!(docs.join("home.md").is_file());
	assert!(!docs.join("home.topic").exists());
	assert!(tmp.path().join("docs/.vitepress/sidebar/kotlin.sidebar.json").is_file());
	assert!(tmp.path().join("docs/.vitepress/locales/en.json").is_file());

	Ok(())
}

#[test]
fn sidebar_rebuilds_from_discovered_tree() -> AnyEmptyResult {
	let tmp = writerside_site()?;

	common::doclift_cmd()
		.arg("sidebar")
		.arg("--repo")
		.arg("kotlin")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Wrote docs/.vitepress/sidebar/kotlin.sidebar.json from kotlin-repo/docs/kr.tree",
		));

	let sidebar = std::fs::read_to_string(tmp.path().join("docs/.vitepress/sidebar/kotlin.sidebar.json"))?;
	assert!(sidebar.contains("\"link\": \"home\""));
	assert!(sidebar.contains("\"kotlin.basics\""));

	Ok(())
}

#[test]
fn sidebar_without_manifest_is_an_error() -> AnyEmptyResult {
	let tmp = markdown_site()?;

	common::doclift_cmd()
		.arg("sidebar")
		.arg("--repo")
		.arg("coil")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("no sidebar manifest found for repository `coil`"));

	Ok(())
}

#[test]
fn finish_copies_version_files_and_assets() -> AnyEmptyResult {
	let tmp = markdown_site()?;

	common::doclift_cmd()
		.arg("finish")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("docs/.vitepress/variables/coil.v.list\ndocs/public/coil\n");

	assert!(tmp.path().join("docs/.vitepress/variables/coil.v.list").is_file());
	assert!(tmp.path().join("docs/public/coil/logos/coil.svg").is_file());

	Ok(())
}

#[test]
fn finish_with_nothing_to_copy() -> AnyEmptyResult {
	let tmp = writerside_site()?;

	common::doclift_cmd()
		.arg("finish")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("Nothing to stage.\n");

	Ok(())
}

#[test]
fn sync_requires_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::doclift_cmd()
		.arg("sync")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("no doclift.toml found"));

	Ok(())
}

#[test]
fn sync_rejects_unknown_repo() -> AnyEmptyResult {
	let tmp = markdown_site()?;

	common::doclift_cmd()
		.arg("sync")
		.arg("--repo")
		.arg("nope")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unknown repository `nope`"));

	Ok(())
}
