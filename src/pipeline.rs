use tracing::{error, info, warn};

use crate::dmarc::{self, Notification, ReportSummary};
use crate::error::Result;
use crate::message;
use crate::notify::Notifier;
use crate::source::{EmailSource, Location};
use crate::store::SummaryStore;

/// The result of the two independent halves of processing one report.
#[derive(Debug)]
pub struct Outcome {
	/// The stored summary, or why it could not be built or stored.
	pub summary: Result<ReportSummary>,
	/// The notification that was sent, `None` if the report had no issues.
	pub notification: Result<Option<Notification>>,
}

/// Turns report emails into stored summaries and notifications.
pub struct Pipeline<S, T, N> {
	source: S,
	store: T,
	notifier: N,
}

impl<S: EmailSource, T: SummaryStore, N: Notifier> Pipeline<S, T, N> {
	pub fn new(source: S, store: T, notifier: N) -> Pipeline<S, T, N> {
		Pipeline { source, store, notifier }
	}

	pub fn into_parts(self) -> (S, T, N) {
		(self.source, self.store, self.notifier)
	}

	/// Processes the email at `location`.
	///
	/// Errors while fetching or decoding the email are returned directly. Once the report is parsed,
	/// storing its summary and notifying about it are attempted separately and reported in the
	/// [`Outcome`].
	pub fn process(&mut self, location: &Location) -> Result<Outcome> {
		info!("processing email from {}", location);

		let email = self.source.fetch(location)?;
		let data = message::locate_report(&email)?;
		let report = dmarc::parse_report(&data)?;
		let xml = String::from_utf8_lossy(&data);

		let summary = dmarc::summarize(&report, location, &xml).and_then(|summary| {
			self.store.persist(&summary)?;
			Ok(summary)
		});
		if let Err(e) = &summary {
			error!("unable to store report {} from {}: {}", report.org_report_id(), location, e);
		}

		let notification = dmarc::classify(&report).and_then(|classification| {
			match classification.notification() {
				Some(notification) => {
					self.notifier.send(&notification.subject, &notification.body)?;
					Ok(Some(notification))
				},
				None => Ok(None),
			}
		});
		if let Err(e) = &notification {
			error!("unable to notify about report {} from {}: {}", report.org_report_id(), location, e);
		}

		Ok(Outcome { summary, notification })
	}

	/// Processes every location on its own; a failing email never stops the others.
	pub fn process_batch<'a, I>(&mut self, locations: I) -> Vec<(Location, Result<Outcome>)>
	where
		I: IntoIterator<Item = &'a Location>,
	{
		locations
			.into_iter()
			.map(|location| {
				let outcome = self.process(location);
				if let Err(e) = &outcome {
					if e.is_format_error() {
						warn!("skipping email {}: {}", location, e);
					} else {
						error!("error processing email {}: {}", location, e);
					}
				}
				(location.clone(), outcome)
			})
			.collect()
	}
}
