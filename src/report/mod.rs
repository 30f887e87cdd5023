//! Report generation.
//!
//! - [`tables`]: row projections of a report, with explicit empty states
//! - [`generator`]: Markdown and HTML renderings of those tables
//! - [`export`]: canonical JSON export

pub mod export;
pub mod generator;
pub mod tables;

pub use export::write_export;
pub use generator::{generate_html_report, generate_markdown_report, RenderOptions, ReportDocument};
pub use tables::ReportTables;
