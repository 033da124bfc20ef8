use flate2::read::GzDecoder;
use mailparse::{MailHeaderMap, ParsedMail};
use std::io::{prelude::*, Cursor};
use tracing::debug;

use crate::error::{Error, Result};

/// A single named attachment, already transfer-decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
	pub filename: String,
	pub data: Vec<u8>,
}

/// The parts of an email the report locator cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEmail {
	/// The raw value of the top-level Content-Type header, parameters included.
	pub content_type: String,
	/// The decoded body of a single-part message. Empty for multipart messages.
	pub body: Vec<u8>,
	/// Named attachments of a multipart message, in document order.
	pub attachments: Vec<Attachment>,
}

impl ParsedEmail {
	/// Parses a raw RFC 5322 message.
	pub fn parse(raw: &[u8]) -> std::result::Result<ParsedEmail, mailparse::MailParseError> {
		let mail = mailparse::parse_mail(raw)?;

		let content_type = mail
			.headers
			.get_first_value("Content-Type")
			.unwrap_or_else(|| "text/plain".to_string());

		let mut email = ParsedEmail {
			content_type,
			body: Vec::new(),
			attachments: Vec::new(),
		};

		if mail.subparts.is_empty() {
			email.body = mail.get_body_raw()?;
		} else {
			collect_attachments(&mail, &mut email.attachments)?;
		}

		Ok(email)
	}
}

fn collect_attachments(part: &ParsedMail, attachments: &mut Vec<Attachment>) -> std::result::Result<(), mailparse::MailParseError> {
	if !part.subparts.is_empty() {
		// unwrap the multipart message
		for subpart in &part.subparts {
			collect_attachments(subpart, attachments)?;
		}
		return Ok(());
	}

	let disposition = part.get_content_disposition();
	let filename = disposition
		.params
		.get("filename")
		.or_else(|| part.ctype.params.get("name"));

	// parts without a name are probably just some human-readable message
	if let Some(filename) = filename {
		attachments.push(Attachment {
			filename: filename.clone(),
			data: part.get_body_raw()?,
		});
	}

	Ok(())
}

/// How the report is carried by the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
	/// The whole message body is a zip archive.
	Archive,
	/// The report is a named attachment.
	Multipart,
}

impl MessageKind {
	pub fn from_content_type(content_type: &str) -> Result<MessageKind> {
		let token = content_type.split_whitespace().next().unwrap_or("");
		let effective = token.trim_end_matches(';').to_ascii_lowercase();

		if effective == "application/zip" {
			Ok(MessageKind::Archive)
		} else if effective.starts_with("multipart/") {
			Ok(MessageKind::Multipart)
		} else {
			Err(Error::UnsupportedContentType(token.to_string()))
		}
	}
}

/// The compression formats a report can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFileType {
	Gzip,
	Zip,
}

impl ReportFileType {
	/// Maps an attachment extension (including the dot) to its decoder.
	pub fn from_extension(extension: &str) -> Option<ReportFileType> {
		match extension {
			".gz" => Some(ReportFileType::Gzip),
			_ => None,
		}
	}

	/// Decompresses the raw data into the bytes of the XML report.
	pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
		let body_reader = Cursor::new(data);
		match self {
			ReportFileType::Gzip => {
				let mut d = GzDecoder::new(body_reader);
				let mut result = Vec::new();
				d.read_to_end(&mut result)?;
				Ok(result)
			},
			ReportFileType::Zip => {
				let mut archive = zip::ZipArchive::new(body_reader)?;

				for i in 0..archive.len() {
					let mut report_file = archive.by_index(i)?;
					if !report_file.name().contains(".xml") {
						debug!("skipping archive entry {}", report_file.name());
						continue;
					}

					let mut result = Vec::new();
					report_file.read_to_end(&mut result)?;
					return Ok(result);
				}

				Err(Error::NoXMLInArchive)
			}
		}
	}
}

/// Returns the extension of the last path element, dot included, or an empty string.
pub fn extension(filename: &str) -> &str {
	match filename.rfind(|c: char| c == '.' || c == '/') {
		Some(i) if filename[i..].starts_with('.') => &filename[i..],
		_ => "",
	}
}

/// Finds the report in the given email and returns it decompressed.
pub fn locate_report(email: &ParsedEmail) -> Result<Vec<u8>> {
	match MessageKind::from_content_type(&email.content_type)? {
		MessageKind::Archive => ReportFileType::Zip.decompress(&email.body),
		MessageKind::Multipart => {
			// only the first attachment is considered
			if let Some(attachment) = email.attachments.first() {
				let ext = extension(&attachment.filename);
				return match ReportFileType::from_extension(ext) {
					Some(filetype) => filetype.decompress(&attachment.data),
					None => Err(Error::UnsupportedAttachmentExtension(ext.to_string())),
				};
			}

			Err(Error::NoReportFound)
		}
	}
}
