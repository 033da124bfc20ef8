//! Read-side views over the stored summaries.

use time::Date;

use crate::dmarc::{aggregate, window_dates, AggregateEntry, ReportSummary};
use crate::store::{StoreError, SummaryStore};

/// How many days the recent view covers.
pub const RECENT_DAYS: u32 = 7;

/// Daily totals for the [`RECENT_DAYS`] days before `today`.
pub fn recent<S: SummaryStore>(store: &mut S, today: Date) -> Result<Vec<AggregateEntry>, StoreError> {
	let dates = window_dates(today, RECENT_DAYS);
	let summaries = store.by_dates(&dates)?;
	Ok(aggregate(&summaries))
}

/// Every report stored under `date`, which must be formatted `YYYY-MM-DD`.
pub fn date_detail<S: SummaryStore>(store: &mut S, date: &str) -> Result<Vec<ReportSummary>, StoreError> {
	store.by_date(date)
}
