use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

use crate::config::NotificationConfig;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
	#[error("invalid address: {0}")]
	Address(#[from] lettre::address::AddressError),
	#[error("could not build message: {0}")]
	Message(#[from] lettre::error::Error),
	#[error(transparent)]
	Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers notifications about reports with issues.
pub trait Notifier {
	fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
	fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
		(**self).send(subject, body)
	}
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
	fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
		(**self).send(subject, body)
	}
}

/// Sends plain-text mail through an authenticated SMTP relay.
pub struct SmtpNotifier {
	transport: SmtpTransport,
	from: String,
	to: String,
}

impl SmtpNotifier {
	pub fn new(config: &NotificationConfig) -> Result<SmtpNotifier, NotifyError> {
		let transport = SmtpTransport::relay(config.host)?
			.port(config.port)
			.credentials(Credentials::new(config.username.to_string(), config.password.to_string()))
			.build();

		Ok(SmtpNotifier {
			transport,
			from: config.from.to_string(),
			to: config.to.to_string(),
		})
	}
}

impl Notifier for SmtpNotifier {
	fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
		let email = Message::builder()
			.from(self.from.parse()?)
			.to(self.to.parse()?)
			.subject(subject)
			.body(body.to_string())?;

		self.transport.send(&email)?;
		info!("sent '{}' to {}", subject, self.to);
		Ok(())
	}
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn send(&mut self, subject: &str, body: &str) -> Result<(), NotifyError> {
		warn!("{}\n{}", subject, body);
		Ok(())
	}
}
