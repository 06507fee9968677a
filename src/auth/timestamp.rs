//! Signing timestamps and the injectable clock that produces them.

// crates.io
use time::{UtcOffset, format_description::well_known::Rfc3339, macros::format_description};
// self
use crate::{_prelude::*, error::SignError};

/// Source of the instant stamped into `X-Ops-Timestamp`.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock [`Clock`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// [`Clock`] pinned to a single instant, for reproducible signatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub OffsetDateTime);
impl FixedClock {
	/// Parses an RFC 3339 instant.
	pub fn parse(value: &str) -> Result<Self, time::error::Parse> {
		OffsetDateTime::parse(value, &Rfc3339).map(Self)
	}
}
impl Clock for FixedClock {
	fn now(&self) -> OffsetDateTime {
		self.0
	}
}

/// Renders `instant` in UTC as RFC 3339 with whole seconds, e.g. `2024-01-02T15:04:05Z`.
pub fn format_timestamp(instant: OffsetDateTime) -> Result<String, SignError> {
	instant
		.to_offset(UtcOffset::UTC)
		.format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
		.map_err(|source| SignError::Timestamp { source })
}

/// Reads `clock` and renders the instant with [`format_timestamp`].
pub fn current_timestamp(clock: &dyn Clock) -> Result<String, SignError> {
	format_timestamp(clock.now())
}
