use serde::Serialize;
use std::collections::BTreeMap;
use time::macros::format_description;
use time::Date;

use super::summary::ReportSummary;

/// Totals of all reports that started on the same UTC date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateEntry {
	pub gmt_date: String,
	pub count_accepted: u64,
	pub count_quarantined: u64,
	pub count_rejected: u64,
}

/// Sums the counts of the given summaries per `gmt_date`, oldest date first.
pub fn aggregate<'a, I>(summaries: I) -> Vec<AggregateEntry>
where
	I: IntoIterator<Item = &'a ReportSummary>,
{
	let mut entries: BTreeMap<&str, AggregateEntry> = BTreeMap::new();

	for summary in summaries {
		let entry = entries
			.entry(summary.gmt_date.as_str())
			.or_insert_with(|| AggregateEntry {
				gmt_date: summary.gmt_date.clone(),
				..AggregateEntry::default()
			});
		entry.count_accepted = entry.count_accepted.saturating_add(summary.count_accepted);
		entry.count_quarantined = entry.count_quarantined.saturating_add(summary.count_quarantined);
		entry.count_rejected = entry.count_rejected.saturating_add(summary.count_rejected);
	}

	entries.into_iter().map(|(_, entry)| entry).collect()
}

/// The `days` dates before `today`, most recent first. `today` itself is never included.
pub fn window_dates(today: Date, days: u32) -> Vec<String> {
	let mut dates = Vec::with_capacity(days as usize);
	let mut current = today;

	for _ in 0..days {
		current = match current.previous_day() {
			Some(date) => date,
			None => break,
		};

		// a valid Date always formats with this description
		if let Ok(formatted) = current.format(format_description!("[year]-[month]-[day]")) {
			dates.push(formatted);
		}
	}

	dates
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use time::macros::date;

	fn summary(gmt_date: &str, accepted: u64, quarantined: u64, rejected: u64) -> ReportSummary {
		ReportSummary {
			gmt_date: gmt_date.to_string(),
			org_report_id: format!("google.com:{}", gmt_date),
			bucket: "bucket".to_string(),
			key: "key".to_string(),
			org_name: "google.com".to_string(),
			report_id: gmt_date.to_string(),
			begin_time: 0,
			end_time: 0,
			count_accepted: accepted,
			count_quarantined: quarantined,
			count_rejected: rejected,
			xml: String::new(),
		}
	}

	#[test]
	fn same_date_is_summed() {
		let summaries = vec![summary("2020-04-17", 1, 0, 0), summary("2020-04-17", 2, 1, 0)];

		assert_eq!(
			aggregate(&summaries),
			vec![AggregateEntry {
				gmt_date: "2020-04-17".to_string(),
				count_accepted: 3,
				count_quarantined: 1,
				count_rejected: 0,
			}]
		);
	}

	#[test]
	fn sorted_by_date() {
		let summaries = vec![
			summary("2020-04-19", 1, 0, 0),
			summary("2020-04-17", 0, 0, 5),
			summary("2020-04-18", 2, 0, 0),
			summary("2020-04-19", 0, 3, 0),
		];

		let entries = aggregate(&summaries);
		let dates: Vec<&str> = entries.iter().map(|e| e.gmt_date.as_str()).collect();
		assert_eq!(dates, vec!["2020-04-17", "2020-04-18", "2020-04-19"]);
		assert_eq!(entries[2].count_accepted, 1);
		assert_eq!(entries[2].count_quarantined, 3);
	}

	#[test]
	fn sums_saturate() {
		let summaries = vec![summary("2020-04-17", u64::MAX, 0, 1), summary("2020-04-17", u64::MAX, 0, 1)];

		let entries = aggregate(&summaries);
		assert_eq!(entries[0].count_accepted, u64::MAX);
		assert_eq!(entries[0].count_rejected, 2);
	}

	#[test]
	fn empty_input() {
		let summaries: Vec<ReportSummary> = Vec::new();
		assert!(aggregate(&summaries).is_empty());
	}

	#[test]
	fn window_excludes_today() {
		assert_eq!(
			window_dates(date!(2020 - 03 - 02), 3),
			vec!["2020-03-01", "2020-02-29", "2020-02-28"]
		);
		assert!(window_dates(date!(2020 - 03 - 02), 0).is_empty());
	}
}
