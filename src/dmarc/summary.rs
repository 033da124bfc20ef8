use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

use super::report::{DispositionCounts, Report};
use crate::error::{Error, Result};
use crate::source::Location;

/// What gets stored for every ingested report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
	/// UTC calendar date of the start of the report window, `YYYY-MM-DD`.
	pub gmt_date: String,
	pub org_report_id: String,
	pub bucket: String,
	pub key: String,
	pub org_name: String,
	pub report_id: String,
	pub begin_time: i64,
	pub end_time: i64,
	pub count_accepted: u64,
	pub count_quarantined: u64,
	pub count_rejected: u64,
	pub xml: String,
}

impl ReportSummary {
	pub fn counts(&self) -> DispositionCounts {
		DispositionCounts {
			accepted: self.count_accepted,
			quarantined: self.count_quarantined,
			rejected: self.count_rejected,
		}
	}
}

fn parse_timestamp(text: &str) -> Result<i64> {
	text.parse().map_err(|_| Error::InvalidDateRange(text.to_string()))
}

/// Formats a unix timestamp as the UTC date it falls on.
pub fn gmt_date(timestamp: i64) -> Result<String> {
	let date = OffsetDateTime::from_unix_timestamp(timestamp)
		.map_err(|_| Error::InvalidDateRange(timestamp.to_string()))?
		.date();

	date.format(format_description!("[year]-[month]-[day]"))
		.map_err(|_| Error::InvalidDateRange(timestamp.to_string()))
}

/// Builds the stored summary of a report found at `origin`.
///
/// Records with an unknown disposition are left out of every count.
pub fn summarize(report: &Report, origin: &Location, xml: &str) -> Result<ReportSummary> {
	let mut counts = DispositionCounts::default();
	for record in &report.records {
		if !counts.add(&record.disposition, record.resolved_count()) {
			warn!("unknown disposition encountered: {}", record.disposition);
		}
	}

	let begin_time = parse_timestamp(&report.date_range_begin)?;
	let end_time = parse_timestamp(&report.date_range_end)?;

	Ok(ReportSummary {
		gmt_date: gmt_date(begin_time)?,
		org_report_id: report.org_report_id(),
		bucket: origin.bucket.clone(),
		key: origin.key.clone(),
		org_name: report.org_name.clone(),
		report_id: report.report_id.clone(),
		begin_time,
		end_time,
		count_accepted: counts.accepted,
		count_quarantined: counts.quarantined,
		count_rejected: counts.rejected,
		xml: xml.to_string(),
	})
}
