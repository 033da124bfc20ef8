//! DMARC aggregate reports: parsing, classification and the stored summaries derived from them.

pub mod aggregate;
pub mod classify;
pub mod report;
pub mod summary;
pub mod types;

pub use aggregate::{aggregate, window_dates, AggregateEntry};
pub use classify::{classify, Classification, Notification};
pub use report::{parse_report, Disposition, DispositionCounts, Record, Report};
pub use summary::{summarize, ReportSummary};
