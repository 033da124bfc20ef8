use tracing::debug;

use super::report::{Disposition, DispositionCounts, Record, Report};
use crate::error::{Error, Result};

pub const NOTIFICATION_SUBJECT: &str = "DMARC Issues Detected";
const NOTIFICATION_HEADER: &str = "Processed Records with issues.\n\n";

/// A notification to send to the domain owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
	pub subject: String,
	pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
	pub counts: DispositionCounts,
	/// One human-readable line per quarantined or rejected record.
	pub violations: Vec<String>,
}

impl Classification {
	/// The notification to raise for this report, if any record was quarantined or rejected.
	pub fn notification(&self) -> Option<Notification> {
		if self.violations.is_empty() {
			return None;
		}

		let mut body = NOTIFICATION_HEADER.to_string();
		for line in &self.violations {
			body.push_str(line);
			body.push('\n');
		}

		Some(Notification {
			subject: NOTIFICATION_SUBJECT.to_string(),
			body,
		})
	}
}

/// Totals the report by disposition and describes every violation.
///
/// Fails on the first record whose disposition is not part of the DMARC vocabulary.
pub fn classify(report: &Report) -> Result<Classification> {
	let mut classification = Classification::default();

	for record in &report.records {
		if let Disposition::Unknown(value) = &record.disposition {
			return Err(Error::UnknownDisposition(value.clone()));
		}

		classification.counts.add(&record.disposition, record.resolved_count());

		if record.disposition.is_violation() {
			debug!("processed record with {}", record.disposition);
			classification.violations.push(violation_message(report, record));
		}
	}

	Ok(classification)
}

/// Formats one line of the notification body.
///
/// Plurals are chosen from the count text, so `01` reads as several emails.
pub fn violation_message(report: &Report, record: &Record) -> String {
	let (plural, verb) = if record.count == "1" { ("", "was") } else { ("s", "were") };

	format!(
		"{} email{} from: {} to: {} {} processed by {} and was marked {}.",
		record.count,
		plural,
		record.source_ip,
		report.policy_domain,
		verb,
		report.org_name,
		record.disposition
	)
}
