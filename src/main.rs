use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use simple_error::bail;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use herald::config::{self, Config};
use herald::notify::{LogNotifier, Notifier, SmtpNotifier};
use herald::pipeline::{Outcome, Pipeline};
use herald::query;
use herald::source::{DirectorySource, ImapSource, Location};
use herald::store::MysqlStore;

#[derive(Parser)]
#[command(version, about = "Collects DMARC aggregate reports and reports on them")]
struct Args {
	/// Path to the config file, created with defaults if missing
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Process every unread report in the DMARC mailbox
	Ingest,
	/// Process one email from the spool directory
	Process { bucket: String, key: String },
	/// Print daily totals for the last week
	Recent,
	/// Print every report stored for a date (YYYY-MM-DD)
	Date { date: String },
}

fn notifier(config: &Config) -> Result<Box<dyn Notifier>, Box<dyn Error>> {
	if config.notification.enabled {
		Ok(Box::new(SmtpNotifier::new(&config.notification)?))
	} else {
		warn!("notifications are disabled, issues will only be logged");
		Ok(Box::new(LogNotifier))
	}
}

fn log_outcomes(results: &[(Location, herald::Result<Outcome>)]) {
	let mut failed = 0;
	for (location, result) in results {
		match result {
			Ok(Outcome { summary, notification }) => {
				if let Ok(summary) = summary {
					info!("{}: stored {} under {}", location, summary.org_report_id, summary.gmt_date);
				}
				if let Ok(Some(_)) = notification {
					info!("{}: sent notification", location);
				}
				if summary.is_err() || notification.is_err() {
					failed += 1;
				}
			},
			Err(_) => failed += 1,
		}
	}

	if failed > 0 {
		error!("{} of {} emails had errors", failed, results.len());
	} else {
		info!("processed {} emails", results.len());
	}
}

fn main() -> Result<(), Box<dyn Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();

	/*
	 * config parsing
	 */
	if !args.config.exists() {
		fs::write(&args.config, toml::to_string(&config::DEFAULT)?)?;
		bail!("could not find config, wrote a default one to {}; edit it and run again", args.config.display());
	}

	let config_text = fs::read_to_string(&args.config)?;
	let config: Config = toml::from_str(&config_text)?;

	/*
	 * database connection
	 */
	let mut store = MysqlStore::connect(config.database.opts(), config.database.table)?;

	match args.command {
		Command::Ingest => {
			if !config.dmarc.enabled {
				bail!("the dmarc mailbox is disabled in the config");
			}
			if !config.dmarc.tls {
				bail!("plaintext IMAP is not supported");
			}

			let mut source = ImapSource::connect(&config.dmarc)?;
			let pending = source.pending(config.dmarc.folder)?;
			info!("found {} unread reports in {}", pending.len(), config.dmarc.folder);

			let mut pipeline = Pipeline::new(source, &mut store, notifier(&config)?);
			log_outcomes(&pipeline.process_batch(&pending));

			let (source, _, _) = pipeline.into_parts();
			source.logout()?;
		},
		Command::Process { bucket, key } => {
			let source = DirectorySource::new(config.spool.root);
			let mut pipeline = Pipeline::new(source, &mut store, notifier(&config)?);
			log_outcomes(&pipeline.process_batch(&[Location::new(bucket, key)]));
		},
		Command::Recent => {
			let today = OffsetDateTime::now_utc().date();
			let entries = query::recent(&mut store, today)?;
			println!("{}", serde_json::to_string_pretty(&entries)?);
		},
		Command::Date { date } => {
			let summaries = query::date_detail(&mut store, &date)?;
			println!("{}", serde_json::to_string_pretty(&summaries)?);
		},
	}

	Ok(())
}
