use native_tls::{TlsConnector, TlsStream};
use regex::Regex;
use std::fmt;
use std::fs;
use std::net::TcpStream;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::config::IMAPConfig;
use crate::message::ParsedEmail;

/// Where a raw report email lives: a container (directory, IMAP folder) and a key within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
	pub bucket: String,
	pub key: String,
}

impl Location {
	pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Location {
		Location {
			bucket: bucket.into(),
			key: key.into(),
		}
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.bucket, self.key)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("invalid location `{0}`")]
	InvalidLocation(String),
	#[error("no message at {0}")]
	NotFound(String),
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Imap(#[from] imap::error::Error),
	#[error(transparent)]
	Tls(#[from] native_tls::Error),
	#[error("could not parse email: {0}")]
	Parse(#[from] mailparse::MailParseError),
	#[error(transparent)]
	Pattern(#[from] regex::Error),
}

/// Fetches raw emails and hands them back parsed.
pub trait EmailSource {
	fn fetch(&mut self, location: &Location) -> Result<ParsedEmail, SourceError>;
}

/// A spool directory with one sub-directory per bucket and one file per email.
pub struct DirectorySource {
	root: PathBuf,
}

impl DirectorySource {
	pub fn new(root: impl Into<PathBuf>) -> DirectorySource {
		DirectorySource { root: root.into() }
	}

	fn path_of(&self, location: &Location) -> Result<PathBuf, SourceError> {
		for part in &[&location.bucket, &location.key] {
			let mut components = Path::new(part.as_str()).components();
			match (components.next(), components.next()) {
				(Some(Component::Normal(_)), None) => {},
				_ => return Err(SourceError::InvalidLocation(location.to_string())),
			}
		}

		Ok(self.root.join(&location.bucket).join(&location.key))
	}
}

impl EmailSource for DirectorySource {
	fn fetch(&mut self, location: &Location) -> Result<ParsedEmail, SourceError> {
		let path = self.path_of(location)?;
		debug!("reading {}", path.display());

		let raw = fs::read(&path)?;
		Ok(ParsedEmail::parse(&raw)?)
	}
}

/// The IMAP mailbox the reports are delivered to. Keys are message UIDs.
pub struct ImapSource {
	session: imap::Session<TlsStream<TcpStream>>,
	selected: Option<String>,
	report_subject: Regex,
}

impl ImapSource {
	pub fn connect(config: &IMAPConfig) -> Result<ImapSource, SourceError> {
		let tls = TlsConnector::builder().build()?;
		let client = imap::connect((config.host, config.port), config.host, &tls)?;
		let session = client.login(config.username, config.password).map_err(|e| e.0)?;
		info!("logged in to {} as {}", config.host, config.username);

		Ok(ImapSource {
			session,
			selected: None,
			// DMARC report subjects end in "Report-ID: <id>"
			report_subject: Regex::new(r"Report-ID: (.*)")?,
		})
	}

	fn select(&mut self, folder: &str) -> Result<(), SourceError> {
		if self.selected.as_deref() != Some(folder) {
			self.session.select(folder)?;
			self.selected = Some(folder.to_string());
		}
		Ok(())
	}

	/// Lists the unread report messages in `folder`.
	pub fn pending(&mut self, folder: &str) -> Result<Vec<Location>, SourceError> {
		self.select(folder)?;

		let mut uids: Vec<u32> = self.session.uid_search("UNSEEN")?.into_iter().collect();
		if uids.is_empty() {
			return Ok(Vec::new());
		}
		uids.sort_unstable();

		let uid_set = uids.iter().map(|uid| uid.to_string()).collect::<Vec<_>>().join(",");
		let fetch_results = self.session.uid_fetch(uid_set, "(UID ENVELOPE)")?;

		let mut locations = Vec::new();
		for fetch_result in fetch_results.iter() {
			let uid = match fetch_result.uid {
				Some(uid) => uid,
				None => continue,
			};
			let subject = fetch_result
				.envelope()
				.and_then(|envelope| envelope.subject)
				.unwrap_or(b"");
			let subject_text = String::from_utf8_lossy(subject);

			if let Some(captures) = self.report_subject.captures(&subject_text) {
				debug!("found report {} in message {}", &captures[1], uid);
				locations.push(Location::new(folder, uid.to_string()));
			} else {
				debug!("skipping subject line '{}'", subject_text);
			}
		}

		Ok(locations)
	}

	pub fn logout(mut self) -> Result<(), SourceError> {
		self.session.logout()?;
		Ok(())
	}
}

impl EmailSource for ImapSource {
	fn fetch(&mut self, location: &Location) -> Result<ParsedEmail, SourceError> {
		let uid: u32 = location
			.key
			.parse()
			.map_err(|_| SourceError::InvalidLocation(location.to_string()))?;
		self.select(&location.bucket)?;

		let message_results = self.session.uid_fetch(uid.to_string(), "RFC822")?;
		let body = message_results
			.iter()
			.find(|message| message.uid == Some(uid))
			.and_then(|message| message.body())
			.ok_or_else(|| SourceError::NotFound(location.to_string()))?;

		Ok(ParsedEmail::parse(body)?)
	}
}
