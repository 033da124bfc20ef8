use mysql::prelude::*;
use mysql::{params, Opts, Pool, PooledConn};
use tracing::{debug, info};

use crate::dmarc::ReportSummary;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error(transparent)]
	Mysql(#[from] mysql::Error),
	#[error("invalid table name `{0}`")]
	InvalidTable(String),
}

/// Where report summaries are kept.
///
/// Summaries are append-only; storing the same report twice keeps both copies.
pub trait SummaryStore {
	fn persist(&mut self, summary: &ReportSummary) -> Result<(), StoreError>;

	/// All summaries whose `gmt_date` is exactly `date`.
	fn by_date(&mut self, date: &str) -> Result<Vec<ReportSummary>, StoreError>;

	/// All summaries whose `gmt_date` is one of `dates`.
	fn by_dates(&mut self, dates: &[String]) -> Result<Vec<ReportSummary>, StoreError>;
}

impl<S: SummaryStore + ?Sized> SummaryStore for &mut S {
	fn persist(&mut self, summary: &ReportSummary) -> Result<(), StoreError> {
		(**self).persist(summary)
	}

	fn by_date(&mut self, date: &str) -> Result<Vec<ReportSummary>, StoreError> {
		(**self).by_date(date)
	}

	fn by_dates(&mut self, dates: &[String]) -> Result<Vec<ReportSummary>, StoreError> {
		(**self).by_dates(dates)
	}
}

/// Keeps summaries in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
	pub summaries: Vec<ReportSummary>,
}

impl SummaryStore for MemoryStore {
	fn persist(&mut self, summary: &ReportSummary) -> Result<(), StoreError> {
		self.summaries.push(summary.clone());
		Ok(())
	}

	fn by_date(&mut self, date: &str) -> Result<Vec<ReportSummary>, StoreError> {
		Ok(self.summaries.iter().filter(|s| s.gmt_date == date).cloned().collect())
	}

	fn by_dates(&mut self, dates: &[String]) -> Result<Vec<ReportSummary>, StoreError> {
		Ok(self
			.summaries
			.iter()
			.filter(|s| dates.contains(&s.gmt_date))
			.cloned()
			.collect())
	}
}

const COLUMNS: &str = "gmt_date, org_report_id, bucket, object_key, org_name, report_id, \
	begin_time, end_time, count_accepted, count_quarantined, count_rejected, xml";

type Row = (String, String, String, String, String, String, i64, i64, u64, u64, u64, String);

fn summary_from_row(row: Row) -> ReportSummary {
	let (
		gmt_date,
		org_report_id,
		bucket,
		key,
		org_name,
		report_id,
		begin_time,
		end_time,
		count_accepted,
		count_quarantined,
		count_rejected,
		xml,
	) = row;

	ReportSummary {
		gmt_date,
		org_report_id,
		bucket,
		key,
		org_name,
		report_id,
		begin_time,
		end_time,
		count_accepted,
		count_quarantined,
		count_rejected,
		xml,
	}
}

/// A MySQL table with one row per ingested report.
pub struct MysqlStore {
	conn: PooledConn,
	table: String,
}

impl MysqlStore {
	pub fn connect(opts: impl Into<Opts>, table: &str) -> Result<MysqlStore, StoreError> {
		if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return Err(StoreError::InvalidTable(table.to_string()));
		}

		let pool = Pool::new(opts.into())?;
		let mut conn = pool.get_conn()?;

		conn.query_drop(format!(
			"CREATE TABLE IF NOT EXISTS {} (
				id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
				gmt_date CHAR(10) NOT NULL,
				org_report_id VARCHAR(255) NOT NULL,
				bucket VARCHAR(255) NOT NULL,
				object_key VARCHAR(1024) NOT NULL,
				org_name VARCHAR(255) NOT NULL,
				report_id VARCHAR(255) NOT NULL,
				begin_time BIGINT NOT NULL,
				end_time BIGINT NOT NULL,
				count_accepted BIGINT UNSIGNED NOT NULL,
				count_quarantined BIGINT UNSIGNED NOT NULL,
				count_rejected BIGINT UNSIGNED NOT NULL,
				xml MEDIUMTEXT NOT NULL,
				INDEX (gmt_date)
			)",
			table
		))?;
		info!("using table {}", table);

		Ok(MysqlStore {
			conn,
			table: table.to_string(),
		})
	}
}

impl SummaryStore for MysqlStore {
	fn persist(&mut self, summary: &ReportSummary) -> Result<(), StoreError> {
		self.conn.exec_drop(
			format!(
				"INSERT INTO {} ({}) VALUES (:gmt_date, :org_report_id, :bucket, :object_key, :org_name, :report_id, \
				:begin_time, :end_time, :count_accepted, :count_quarantined, :count_rejected, :xml)",
				self.table, COLUMNS
			),
			params! {
				"gmt_date" => &summary.gmt_date,
				"org_report_id" => &summary.org_report_id,
				"bucket" => &summary.bucket,
				"object_key" => &summary.key,
				"org_name" => &summary.org_name,
				"report_id" => &summary.report_id,
				"begin_time" => summary.begin_time,
				"end_time" => summary.end_time,
				"count_accepted" => summary.count_accepted,
				"count_quarantined" => summary.count_quarantined,
				"count_rejected" => summary.count_rejected,
				"xml" => &summary.xml
			},
		)?;
		debug!("stored {} for {}", summary.org_report_id, summary.gmt_date);
		Ok(())
	}

	fn by_date(&mut self, date: &str) -> Result<Vec<ReportSummary>, StoreError> {
		let summaries = self.conn.exec_map(
			format!("SELECT {} FROM {} WHERE gmt_date = ? ORDER BY id", COLUMNS, self.table),
			(date,),
			summary_from_row,
		)?;
		Ok(summaries)
	}

	fn by_dates(&mut self, dates: &[String]) -> Result<Vec<ReportSummary>, StoreError> {
		if dates.is_empty() {
			return Ok(Vec::new());
		}

		let placeholders = vec!["?"; dates.len()].join(", ");
		let summaries = self.conn.exec_map(
			format!("SELECT {} FROM {} WHERE gmt_date IN ({}) ORDER BY id", COLUMNS, self.table, placeholders),
			dates.to_vec(),
			summary_from_row,
		)?;
		Ok(summaries)
	}
}
