mod csv;
mod summary;

pub use csv::{CSV_HEADER, SummaryRow, append_summary_row};
pub use summary::RunSummary;
