use std::fmt;

use xml::reader::{EventReader, XmlEvent};

use super::types::{Feedback, Policy};
use crate::error::{Error, Result};

/// The action a receiver applied to the messages of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
	None,
	Quarantine,
	Reject,
	/// Anything outside the DMARC vocabulary, kept verbatim.
	Unknown(String),
}

impl Disposition {
	pub fn as_str(&self) -> &str {
		match self {
			Disposition::None => "none",
			Disposition::Quarantine => "quarantine",
			Disposition::Reject => "reject",
			Disposition::Unknown(value) => value,
		}
	}

	/// Whether the receiver refused to deliver the message normally.
	pub fn is_violation(&self) -> bool {
		matches!(self, Disposition::Quarantine | Disposition::Reject)
	}
}

impl From<&str> for Disposition {
	fn from(value: &str) -> Disposition {
		match value {
			"none" => Disposition::None,
			"quarantine" => Disposition::Quarantine,
			"reject" => Disposition::Reject,
			other => Disposition::Unknown(other.to_string()),
		}
	}
}

impl fmt::Display for Disposition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Message totals per known disposition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispositionCounts {
	pub accepted: u64,
	pub quarantined: u64,
	pub rejected: u64,
}

impl DispositionCounts {
	/// Adds `count` to the bucket of `disposition`. Returns false if the disposition is unknown.
	pub fn add(&mut self, disposition: &Disposition, count: u64) -> bool {
		match disposition {
			Disposition::None => self.accepted = self.accepted.saturating_add(count),
			Disposition::Quarantine => self.quarantined = self.quarantined.saturating_add(count),
			Disposition::Reject => self.rejected = self.rejected.saturating_add(count),
			Disposition::Unknown(_) => return false,
		}
		true
	}

	pub fn get(&self, disposition: &Disposition) -> Option<u64> {
		match disposition {
			Disposition::None => Some(self.accepted),
			Disposition::Quarantine => Some(self.quarantined),
			Disposition::Reject => Some(self.rejected),
			Disposition::Unknown(_) => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	pub source_ip: String,
	/// The count exactly as the report states it.
	pub count: String,
	pub disposition: Disposition,
	pub header_from: String,
	pub envelope_from: String,
	pub dkim: String,
	pub spf: String,
}

impl Record {
	/// The number of messages this record stands for. Unreadable counts are treated as one message.
	pub fn resolved_count(&self) -> u64 {
		self.count.parse().unwrap_or(1)
	}
}

/// Policy as published by the domain owner at the time of the report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedPolicy {
	pub adkim: String,
	pub aspf: String,
	pub p: String,
	pub sp: String,
	pub pct: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
	pub org_name: String,
	pub report_id: String,
	pub date_range_begin: String,
	pub date_range_end: String,
	pub policy_domain: String,
	pub policy: PublishedPolicy,
	pub records: Vec<Record>,
}

impl Report {
	/// `org_name:report_id`, which identifies a report across submissions.
	pub fn org_report_id(&self) -> String {
		format!("{}:{}", self.org_name, self.report_id)
	}
}

impl From<Feedback> for Report {
	fn from(feedback: Feedback) -> Report {
		let Policy { domain, adkim, aspf, p, sp, pct, .. } = feedback.policy_published;
		let metadata = feedback.report_metadata;

		let records = feedback
			.record
			.into_iter()
			.map(|record| Record {
				disposition: Disposition::from(record.row.policy_evaluated.disposition.as_str()),
				source_ip: record.row.source_ip,
				count: record.row.count,
				header_from: record.identifiers.header_from,
				envelope_from: record.identifiers.envelope_from,
				dkim: record.row.policy_evaluated.dkim,
				spf: record.row.policy_evaluated.spf,
			})
			.collect();

		Report {
			org_name: metadata.org_name,
			report_id: metadata.report_id,
			date_range_begin: metadata.date_range.begin,
			date_range_end: metadata.date_range.end,
			policy_domain: domain,
			policy: PublishedPolicy { adkim, aspf, p, sp, pct },
			records,
		}
	}
}

/// The local name of the first element in `data`, if the document gets that far.
fn root_element(data: &[u8]) -> Option<String> {
	for event in EventReader::new(data) {
		match event {
			Ok(XmlEvent::StartElement { name, .. }) => return Some(name.local_name),
			Ok(_) => continue,
			Err(_) => return None,
		}
	}
	None
}

/// Parses the XML of an aggregate report. The root element must be `feedback`.
pub fn parse_report(data: &[u8]) -> Result<Report> {
	if let Some(root) = root_element(data) {
		if root != "feedback" {
			let message = format!("expected a feedback document, found <{}>", root);
			return Err(Error::MalformedReport(serde::de::Error::custom(message)));
		}
	}

	let feedback: Feedback = serde_xml_rs::from_reader(data)?;
	Ok(Report::from(feedback))
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	const GOOGLE: &str = include_str!("../../tests/fixtures/google.xml");
	const AMAZON: &str = include_str!("../../tests/fixtures/amazonses.xml");

	#[test]
	fn parse_google() {
		let report = parse_report(GOOGLE.as_bytes()).unwrap();

		assert_eq!(report.org_name, "google.com");
		assert_eq!(report.report_id, "8047041664389952409");
		assert_eq!(report.org_report_id(), "google.com:8047041664389952409");
		assert_eq!(report.date_range_begin, "1587081600");
		assert_eq!(report.date_range_end, "1587167999");
		assert_eq!(report.policy_domain, "ericdaugherty.com");
		assert_eq!(report.policy.p, "reject");
		assert_eq!(
			report.records,
			vec![Record {
				source_ip: "209.85.220.41".to_string(),
				count: "4".to_string(),
				disposition: Disposition::None,
				header_from: "ericdaugherty.com".to_string(),
				envelope_from: String::new(),
				dkim: "pass".to_string(),
				spf: "pass".to_string(),
			}]
		);
	}

	#[test]
	fn parse_amazon_keeps_record_order() {
		let report = parse_report(AMAZON.as_bytes()).unwrap();

		assert_eq!(report.org_name, "AMAZON-SES");
		let ips: Vec<&str> = report.records.iter().map(|r| r.source_ip.as_str()).collect();
		assert_eq!(
			ips,
			vec![
				"209.85.167.48",
				"209.85.208.180",
				"209.85.167.47",
				"209.85.208.179",
				"209.85.208.175",
				"209.85.208.174",
			]
		);
		assert_eq!(report.records[0].envelope_from, "ericdaugherty.com");
	}

	#[test]
	fn unknown_elements_are_ignored() {
		let xml = r#"<?xml version="1.0"?>
<feedback>
	<version>2.0</version>
	<report_metadata>
		<org_name>example.net</org_name>
		<report_id>r-1</report_id>
		<generator>future-reporter 9.1</generator>
		<date_range><begin>1</begin><end>2</end></date_range>
	</report_metadata>
	<policy_published><domain>example.com</domain><np>reject</np></policy_published>
	<record>
		<row>
			<source_ip>192.0.2.1</source_ip>
			<count>3</count>
			<policy_evaluated><disposition>reject</disposition><reason><type>local_policy</type></reason></policy_evaluated>
		</row>
	</record>
	<extension><anything>at all</anything></extension>
</feedback>"#;

		let report = parse_report(xml.as_bytes()).unwrap();
		assert_eq!(report.org_name, "example.net");
		assert_eq!(report.records.len(), 1);
		assert_eq!(report.records[0].disposition, Disposition::Reject);
		assert_eq!(report.records[0].resolved_count(), 3);
	}

	#[test]
	fn malformed_xml() {
		let result = parse_report(b"<feedback><report_metadata>");
		assert!(matches!(result, Err(Error::MalformedReport(_))));

		let result = parse_report(b"this is not xml");
		assert!(matches!(result, Err(Error::MalformedReport(_))));
	}

	#[test]
	fn missing_metadata() {
		let result = parse_report(b"<?xml version=\"1.0\"?><something><else>1</else></something>");
		assert!(matches!(result, Err(Error::MalformedReport(_))));
	}

	#[test]
	fn root_must_be_feedback() {
		let xml = GOOGLE.replace("<feedback>", "<notfeedback>").replace("</feedback>", "</notfeedback>");
		assert!(xml.contains("<notfeedback>"));

		let result = parse_report(xml.as_bytes());
		assert!(matches!(result, Err(Error::MalformedReport(_))));
	}

	#[test]
	fn counts_saturate_instead_of_overflowing() {
		let mut counts = DispositionCounts::default();
		assert!(counts.add(&Disposition::None, u64::MAX));
		assert!(counts.add(&Disposition::None, u64::MAX));
		assert!(counts.add(&Disposition::Reject, 2));
		assert_eq!(counts.get(&Disposition::None), Some(u64::MAX));
		assert_eq!(counts.rejected, 2);
	}

	#[test]
	fn unknown_disposition_is_kept() {
		assert_eq!(Disposition::from("discard"), Disposition::Unknown("discard".to_string()));
		assert_eq!(Disposition::from("discard").to_string(), "discard");
	}

	#[test]
	fn counts_fall_back_to_one() {
		let mut record = parse_report(GOOGLE.as_bytes()).unwrap().records.remove(0);
		assert_eq!(record.resolved_count(), 4);

		for text in &["x", "", "-3", "1.5"] {
			record.count = text.to_string();
			assert_eq!(record.resolved_count(), 1, "count text {:?}", text);
		}

		record.count = "01".to_string();
		assert_eq!(record.resolved_count(), 1);
		record.count = "007".to_string();
		assert_eq!(record.resolved_count(), 7);
	}
}
