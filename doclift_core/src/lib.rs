//! `doclift_core` turns documentation written for other site generators into
//! one canonical Markdown dialect with embedded components. It understands
//! Writerside `.topic` XML, Writerside flavoured Markdown and Material for
//! MkDocs Markdown, and builds the sidebars and locale dictionaries the site
//! needs to publish them.
//!
//! ## Processing Pipeline
//!
//! ```text
//! upstream repository
//!   -> Strategy::post_detect (flatten, remove redundant files)
//!   -> markdown transform / topic transform (includes, snippets, cards, links)
//!   -> sidebar + locale dictionaries
//! site render
//!   -> RenderPipeline (admonitions, tabs, exercises, variables, ...)
//! ```
//!
//! ## Modules
//!
//! - [`topic`]: rewrites of the `.topic` XML dialect, including `<topic>`
//!   export.
//! - [`markdown`]: rewrites of Writerside flavoured Markdown.
//! - [`render`]: the ordered render stages applied to every page.
//! - [`sidebar`] and [`locale`]: sidebar trees and their translations.
//! - [`strategy`]: per-repository lifecycle hooks.
//! - [`preprocess`]: the single document entry point used before machine
//!   translation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doclift_core::Document;
//! use doclift_core::Dialect;
//! use doclift_core::RenderEnv;
//! use doclift_core::RenderPipeline;
//!
//! let document = Document::read("docs/guide.md", Dialect::MkDocsMd).unwrap();
//! let env = RenderEnv::new(Some("koog".into()), "guide.md");
//! let rendered = RenderPipeline::default().run(&document, &env);
//! println!("{}", rendered.content);
//! ```

pub use config::*;
pub use context::*;
pub use document::*;
pub use error::*;
pub use locale::*;
pub use preprocess::*;
pub use render::*;
pub use sidebar::*;
pub use snippet::*;
pub use strategy::*;

pub mod admonition;
pub mod code_tabs;
pub mod config;
mod context;
pub mod diff_marker;
mod document;
#[allow(unused_assignments)]
mod error;
pub mod exercise;
pub mod include;
pub mod locale;
pub mod lookup;
pub mod markdown;
pub mod preprocess;
pub mod render;
pub mod sidebar;
pub mod snippet;
pub mod stages;
pub mod strategy;
pub mod tabs;
pub mod text;
pub mod topic;

#[cfg(test)]
mod __fixtures;
