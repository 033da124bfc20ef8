//! The DMARC aggregate report schema as it appears on the wire.
//!
//! Every leaf is kept as text; interpretation happens in [`super::report`].
//! Elements that are not listed here are skipped by the deserializer.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportDateRange {
	pub begin: String,
	pub end: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
	pub org_name: String,
	pub email: String,
	pub extra_contact_info: String,
	pub report_id: String,
	pub date_range: ReportDateRange,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Policy {
	pub domain: String,
	pub adkim: String,
	pub aspf: String,
	pub p: String,
	pub sp: String,
	pub pct: String,
	pub fo: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordRowPolicy {
	pub disposition: String,
	pub dkim: String,
	pub spf: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordRow {
	pub source_ip: String,
	pub count: String,
	pub policy_evaluated: RecordRowPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordIdentifiers {
	pub envelope_from: String,
	pub header_from: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordDKIMResult {
	pub domain: String,
	pub result: String,
	pub selector: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordSPFResult {
	pub domain: String,
	pub scope: String,
	pub result: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordResults {
	pub dkim: Vec<RecordDKIMResult>,
	pub spf: Vec<RecordSPFResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Record {
	pub row: RecordRow,
	pub identifiers: RecordIdentifiers,
	pub auth_results: RecordResults,
}

/// The `feedback` root element. Only `report_metadata` is mandatory.
#[derive(Debug, Deserialize)]
pub struct Feedback {
	pub report_metadata: ReportMetadata,
	#[serde(default)]
	pub policy_published: Policy,
	#[serde(default)]
	pub record: Vec<Record>,
}
