use mysql::OptsBuilder;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
pub struct Config<'a> {
	#[serde(borrow)]
	pub database: DatabaseConfig<'a>,

	#[serde(borrow)]
	pub dmarc: IMAPConfig<'a>,

	#[serde(borrow)]
	pub spool: SpoolConfig<'a>,

	#[serde(borrow)]
	pub notification: NotificationConfig<'a>,
}

#[derive(Deserialize, Serialize)]
pub struct DatabaseConfig<'a> {
	pub host: &'a str,
	pub username: &'a str,
	pub password: &'a str,
	pub database: &'a str,
	pub table: &'a str,
}

impl DatabaseConfig<'_> {
	pub fn opts(&self) -> OptsBuilder {
		OptsBuilder::new()
			.ip_or_hostname(Some(self.host))
			.user(Some(self.username))
			.pass(Some(self.password))
			.db_name(Some(self.database))
	}
}

#[derive(Deserialize, Serialize)]
pub struct IMAPConfig<'a> {
	pub enabled: bool,
	pub host: &'a str,
	pub port: u16,
	pub tls: bool,
	pub username: &'a str,
	pub password: &'a str,
	pub folder: &'a str,
}

/// Raw emails dropped on disk, one directory per bucket.
#[derive(Deserialize, Serialize)]
pub struct SpoolConfig<'a> {
	pub root: &'a str,
}

#[derive(Deserialize, Serialize)]
pub struct NotificationConfig<'a> {
	pub enabled: bool,
	pub host: &'a str,
	pub port: u16,
	pub username: &'a str,
	pub password: &'a str,
	pub from: &'a str,
	pub to: &'a str,
}

pub const DEFAULT: Config = Config {
	database: DatabaseConfig {
		host: "localhost",
		username: "username",
		password: "password123",
		database: "herald",
		table: "dmarc_reports",
	},
	dmarc: IMAPConfig {
		enabled: true,
		host: "localhost",
		port: 993,
		tls: true,
		username: "reports@dmarc.some-cool-address.invalid",
		password: "password123",
		folder: "INBOX",
	},
	spool: SpoolConfig {
		root: "spool",
	},
	notification: NotificationConfig {
		enabled: false,
		host: "localhost",
		port: 465,
		username: "herald@some-cool-address.invalid",
		password: "password123",
		from: "herald@some-cool-address.invalid",
		to: "postmaster@some-cool-address.invalid",
	},
};
