use crate::notify::NotifyError;
use crate::source::SourceError;
use crate::store::StoreError;

/// Everything that can go wrong while turning one report email into a summary and a notification.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("could not fetch email: {0}")]
	Fetch(#[from] SourceError),

	#[error("unknown content type {0}")]
	UnsupportedContentType(String),
	#[error("unknown file extension {0}")]
	UnsupportedAttachmentExtension(String),
	#[error("no xml file found in zip data")]
	NoXMLInArchive,
	#[error("no reports found in email")]
	NoReportFound,
	#[error("could not read zip archive: {0}")]
	Archive(#[from] zip::result::ZipError),
	#[error("could not decompress report: {0}")]
	Decompress(#[from] std::io::Error),
	#[error("malformed report: {0}")]
	MalformedReport(#[from] serde_xml_rs::Error),

	#[error("unknown disposition {0}")]
	UnknownDisposition(String),
	#[error("invalid date range value `{0}`")]
	InvalidDateRange(String),

	#[error("could not persist summary: {0}")]
	Persist(#[from] StoreError),
	#[error("could not send notification: {0}")]
	Notify(#[from] NotifyError),
}

impl Error {
	/// Format errors mean the email itself can never be processed, no matter how often it is retried.
	pub fn is_format_error(&self) -> bool {
		matches!(
			self,
			Error::UnsupportedContentType(_)
				| Error::UnsupportedAttachmentExtension(_)
				| Error::NoXMLInArchive
				| Error::NoReportFound
				| Error::Archive(_)
				| Error::Decompress(_)
				| Error::MalformedReport(_)
		)
	}
}

pub type Result<T> = std::result::Result<T, Error>;
