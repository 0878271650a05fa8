use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use doclift_cli::Commands;
use doclift_cli::DocliftCli;
use doclift_core::AnyEmptyResult;
use doclift_core::Dialect;
use doclift_core::DocliftConfig;
use doclift_core::Document;
use doclift_core::PreprocessMode;
use doclift_core::RenderEnv;
use doclift_core::RenderPipeline;
use doclift_core::SiteContext;
use doclift_core::SyncTask;
use doclift_core::TranslateContext;
use doclift_core::detect_files;
use doclift_core::patterns_for;
use doclift_core::preprocess_in;
use doclift_core::strategy_for;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = DocliftCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Sync { repo }) => run_sync(&args, repo.as_deref()),
		Some(Commands::Finish { repo }) => run_finish(&args, repo.as_deref()),
		Some(Commands::Sidebar { repo }) => run_sidebar(&args, repo),
		Some(Commands::Preprocess {
			file,
			project,
			mode,
			check,
		}) => run_preprocess(&args, file, project, *mode, *check),
		Some(Commands::Render {
			file,
			doc_type,
			skip,
			check,
		}) => run_render(&args, file, doc_type.clone(), skip, *check),
		Some(Commands::Stages) => {
			run_stages();
			Ok(())
		}
		None => {
			eprintln!("No subcommand specified. Run `doclift --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<doclift_core::DocliftError>() {
			Ok(doclift_err) => {
				let report: miette::Report = (*doclift_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr so stdout only carries command output. `RUST_LOG`
/// overrides the default level.
fn init_tracing(verbose: bool, use_color: bool) {
	let level = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("warn,doclift={level},doclift_core={level}")));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &DocliftCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_sync(args: &DocliftCli, repo: Option<&str>) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = DocliftConfig::load_required(&root)?;
	let site = SiteContext::new(root.clone(), config.site.clone());
	let repos = config.select_repos(repo)?;
	let mut total = 0;

	for repo in &repos {
		let strategy = strategy_for(repo);
		strategy.post_sync(&site, repo)?;

		let patterns = patterns_for(strategy.as_ref(), repo);
		let mut task = SyncTask {
			files: detect_files(&site.repo_root(repo), &patterns)?,
		};
		strategy.post_detect(&site, repo, &mut task)?;

		println!("{}", colored!(repo.name.as_str(), bold));
		for file in &task.files {
			println!("  {file}");
		}
		total += task.files.len();
	}

	println!();
	println!(
		"{}",
		colored!(
			format!(
				"Prepared {total} document(s) from {} repository(ies).",
				repos.len()
			),
			green
		)
	);

	Ok(())
}

fn run_finish(args: &DocliftCli, repo: Option<&str>) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = DocliftConfig::load_required(&root)?;
	let site = SiteContext::new(root, config.site.clone());
	let mut context = TranslateContext::default();

	for repo in config.select_repos(repo)? {
		strategy_for(repo).post_translate(&site, repo, &mut context)?;
	}

	if context.git_add_paths.is_empty() {
		println!("Nothing to stage.");
		return Ok(());
	}

	for path in &context.git_add_paths {
		println!("{}", path.display());
	}

	Ok(())
}

fn run_sidebar(args: &DocliftCli, name: &str) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = DocliftConfig::load_required(&root)?;
	let site = SiteContext::new(root.clone(), config.site.clone());

	for repo in config.select_repos(Some(name))? {
		let Some(manifest) = site.sidebar_manifest(repo)? else {
			return Err(format!("no sidebar manifest found for repository `{}`", repo.name).into());
		};

		let path = site.generate_sidebar(repo, &manifest)?;
		println!(
			"{} {} from {}",
			colored!("Wrote", green),
			make_relative(&path, &root),
			make_relative(&manifest, &root)
		);
	}

	Ok(())
}

fn run_preprocess(
	args: &DocliftCli,
	file: &Path,
	project: &str,
	mode: PreprocessMode,
	check: bool,
) -> AnyEmptyResult {
	let root = resolve_root(args);
	let document = Document::read(file, Dialect::WritersideMd)?;
	let docs_root = root.join(format!("{project}-repo")).join("docs");
	let file_name = document_name(file, &docs_root);

	tracing::debug!(file = %file_name, project, mode = %mode, "preprocessing document");
	let output = preprocess_in(&root, &document.content, &file_name, project, mode);
	emit(file, &document.content, &output, check);

	Ok(())
}

fn run_render(
	args: &DocliftCli,
	file: &Path,
	doc_type: Option<String>,
	skip: &[String],
	check: bool,
) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = DocliftConfig::load(&root)?;
	let writerside = match (&config, doc_type.as_deref()) {
		(Some(config), Some(doc_type)) => config.repos_named(doc_type).any(|repo| repo.is_writerside()),
		_ => false,
	};
	let site = config.map(|config| config.site).unwrap_or_default();
	let document = Document::read(file, Dialect::MkDocsMd)?;
	let relative = document
		.path
		.strip_prefix(&root)
		.unwrap_or(&document.path)
		.to_path_buf();
	let env = RenderEnv::new(doc_type, relative)
		.with_variables_from(&root.join(&site.variables_dir))
		.with_writerside(writerside);

	let mut pipeline = RenderPipeline::default();
	for name in skip {
		if !pipeline.contains(name) {
			tracing::warn!(stage = %name, "unknown render stage, run `doclift stages` for the list");
			continue;
		}
		pipeline = pipeline.without(name);
	}

	let rendered = pipeline.run(&document, &env);
	emit(file, &document.content, &rendered.content, check);

	Ok(())
}

fn run_stages() {
	for name in RenderPipeline::default().stage_names() {
		println!("{name}");
	}
}

/// Print `output`, or with `check` compare it against `current` and exit
/// with status 1 when they differ.
fn emit(file: &Path, current: &str, output: &str, check: bool) {
	if !check {
		print!("{output}");
		return;
	}

	if current == output {
		println!("{} is up to date.", file.display());
		return;
	}

	eprintln!("{} {} would change:", colored!("Stale:", yellow), file.display());
	print_diff(current, output);
	process::exit(1);
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Name of `file` as the pre-processor sees it: relative to the project's
/// docs directory when inside it, otherwise the bare file name.
fn document_name(file: &Path, docs_root: &Path) -> String {
	file.strip_prefix(docs_root)
		.ok()
		.or_else(|| file.file_name().map(Path::new))
		.unwrap_or(file)
		.to_string_lossy()
		.replace('\\', "/")
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
