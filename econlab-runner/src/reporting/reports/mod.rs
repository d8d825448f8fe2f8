//! Report generators.

mod markdown;
mod summary;

pub use markdown::MarkdownReportGenerator;
pub use summary::{render_matrix_text, SummaryTable};
