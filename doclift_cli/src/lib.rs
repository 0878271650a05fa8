use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use doclift_core::PreprocessMode;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Aggregate upstream documentation into one canonical markdown dialect.",
	long_about = "doclift pulls documentation written for Writerside and MkDocs into a single \
	              documentation site.\n\nIt rewrites `.topic` XML, Writerside markdown and \
	              MkDocs markdown into one markdown dialect with embedded components, and \
	              builds the sidebars and locale dictionaries the site needs.\n\nQuick start:\n  \
	              doclift sync        Prepare synced repositories for translation\n  doclift \
	              finish      Copy assets and version files after translation\n  doclift render \
	              FILE Print a page after the render stages\n  doclift stages      List the \
	              render stages in order"
)]
pub struct DocliftCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the documentation site root.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable debug logging. `RUST_LOG` takes precedence when set.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Prepare synced repositories for translation.
	///
	/// Detects the documents of each configured repository, runs the
	/// strategy hooks that flatten, export and rewrite them in place, and
	/// regenerates the repository sidebar. Prints the documents to translate.
	Sync {
		/// Only process repositories with this name.
		#[arg(long)]
		repo: Option<String>,
	},
	/// Finish a translation run.
	///
	/// Copies version files and assets of each repository into the site and
	/// prints the paths that need to be staged for commit.
	Finish {
		/// Only process repositories with this name.
		#[arg(long)]
		repo: Option<String>,
	},
	/// Rebuild the sidebar and locale dictionaries of one repository.
	Sidebar {
		/// Name of the repository to rebuild.
		#[arg(long)]
		repo: String,
	},
	/// Pre-process one document the way the translation service does.
	///
	/// Looks up includes, snippets and titles in `<site>/<project>-repo`.
	/// Prints the result, or a diff with `--check`.
	Preprocess {
		/// Document to pre-process.
		file: PathBuf,

		/// Project the document belongs to.
		#[arg(long)]
		project: String,

		/// Which transforms to apply: `topic`, `markdown`, `both` or `none`.
		#[arg(long, default_value_t = PreprocessMode::Both)]
		mode: PreprocessMode,

		/// Exit with a non-zero status when the document would change,
		/// printing the difference instead of the result.
		#[arg(long, default_value_t = false)]
		check: bool,
	},
	/// Print a page after the render stages.
	Render {
		/// Markdown page to render.
		file: PathBuf,

		/// Documentation type of the page, used for variables and versions.
		#[arg(long)]
		doc_type: Option<String>,

		/// Skip a render stage by name. May be repeated.
		#[arg(long = "skip", value_name = "STAGE")]
		skip: Vec<String>,

		/// Exit with a non-zero status when rendering would change the page,
		/// printing the difference instead of the result.
		#[arg(long, default_value_t = false)]
		check: bool,
	},
	/// List the render stages in the order they run.
	Stages,
}
