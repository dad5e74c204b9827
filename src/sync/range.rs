//! Validated date ranges for data sync.

// crates.io
use time::{Date, Time, UtcOffset, format_description::well_known::Rfc3339, macros::format_description};
// self
use crate::{_prelude::*, error::InputError};

/// One bound of a date range as received on the wire: Unix seconds or a date string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateBound {
	/// Seconds since the Unix epoch.
	Unix(i64),
	/// RFC 3339 timestamp, `YYYY-MM-DD` date (midnight UTC), or decimal seconds.
	Text(String),
}
impl DateBound {
	fn resolve(&self, bound: &'static str) -> Result<OffsetDateTime, InputError> {
		let invalid = |reason: String| InputError::InvalidDate { bound, reason };

		match self {
			Self::Unix(secs) => OffsetDateTime::from_unix_timestamp(*secs)
				.map_err(|e| invalid(e.to_string())),
			Self::Text(raw) => {
				let raw = raw.trim();

				if raw.is_empty() {
					return Err(invalid("value is empty".into()));
				}
				if let Ok(secs) = raw.parse::<i64>() {
					return Self::Unix(secs).resolve(bound);
				}
				if let Ok(instant) = OffsetDateTime::parse(raw, &Rfc3339) {
					return Ok(instant);
				}

				Date::parse(raw, format_description!("[year]-[month]-[day]"))
					.map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
					.map_err(|_| invalid(format!("`{raw}` is neither Unix seconds nor RFC 3339")))
			},
		}
	}
}
impl From<i64> for DateBound {
	fn from(value: i64) -> Self {
		Self::Unix(value)
	}
}
impl From<&str> for DateBound {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

/// Inclusive `[start, end]` window, normalized to UTC.
///
/// Both bounds are at or after the Unix epoch and `start <= end`. The RFC 3339 renderings are
/// computed once so every route embeds the same text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateRange {
	start: OffsetDateTime,
	end: OffsetDateTime,
	start_rfc3339: String,
	end_rfc3339: String,
}
impl DateRange {
	/// Validates and normalizes a range.
	pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self> {
		let start = start.to_offset(UtcOffset::UTC);
		let end = end.to_offset(UtcOffset::UTC);

		check_epoch("start", start)?;
		check_epoch("end", end)?;

		if start > end {
			return Err(InputError::InvertedRange.into());
		}

		Ok(Self {
			start_rfc3339: render("start", start)?,
			end_rfc3339: render("end", end)?,
			start,
			end,
		})
	}

	/// Builds a range from Unix seconds.
	pub fn from_unix(start: i64, end: i64) -> Result<Self> {
		Self::parse(&DateBound::Unix(start), &DateBound::Unix(end))
	}

	/// Builds a range from wire bounds.
	pub fn parse(start: &DateBound, end: &DateBound) -> Result<Self> {
		Self::new(start.resolve("start")?, end.resolve("end")?)
	}

	/// Start instant.
	pub fn start(&self) -> OffsetDateTime {
		self.start
	}

	/// End instant.
	pub fn end(&self) -> OffsetDateTime {
		self.end
	}

	/// Start instant as RFC 3339.
	pub fn start_rfc3339(&self) -> String {
		self.start_rfc3339.clone()
	}

	/// End instant as RFC 3339.
	pub fn end_rfc3339(&self) -> String {
		self.end_rfc3339.clone()
	}
}

fn check_epoch(bound: &'static str, instant: OffsetDateTime) -> Result<(), InputError> {
	if instant.unix_timestamp() < 0 {
		return Err(InputError::InvalidDate { bound, reason: "precedes the Unix epoch".into() });
	}

	Ok(())
}

fn render(bound: &'static str, instant: OffsetDateTime) -> Result<String, InputError> {
	instant.format(&Rfc3339).map_err(|e| InputError::InvalidDate { bound, reason: e.to_string() })
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn accepts_all_wire_shapes() {
		let from_numbers = DateRange::from_unix(1_700_000_000, 1_700_086_400)
			.expect("Numeric bounds should be accepted.");
		let from_text = DateRange::parse(
			&DateBound::from("2023-11-14T22:13:20Z"),
			&DateBound::from("1700086400"),
		)
		.expect("Textual bounds should be accepted.");

		assert_eq!(from_numbers, from_text);
		assert_eq!(from_numbers.start_rfc3339(), "2023-11-14T22:13:20Z");

		let dates = DateRange::parse(&DateBound::from("2024-01-01"), &DateBound::from("2024-01-02"))
			.expect("Plain dates should be accepted.");

		assert_eq!(dates.start(), macros::datetime!(2024-01-01 00:00 UTC));
	}

	#[test]
	fn offsets_are_normalized_to_utc() {
		let range = DateRange::parse(
			&DateBound::from("2024-01-01T02:00:00+02:00"),
			&DateBound::from("2024-01-01T00:00:00Z"),
		)
		.expect("Equal instants form a valid range.");

		assert_eq!(range.start_rfc3339(), "2024-01-01T00:00:00Z");
		assert_eq!(range.start(), range.end());
	}

	#[test]
	fn rejects_inverted_negative_and_garbage_bounds() {
		assert!(matches!(
			DateRange::from_unix(10, 5),
			Err(Error::Input(InputError::InvertedRange))
		));
		assert!(matches!(
			DateRange::from_unix(-1, 5),
			Err(Error::Input(InputError::InvalidDate { bound: "start", .. }))
		));
		assert!(matches!(
			DateRange::parse(&DateBound::Unix(0), &DateBound::from("tomorrow")),
			Err(Error::Input(InputError::InvalidDate { bound: "end", .. }))
		));
	}

	#[test]
	fn bounds_deserialize_untagged() {
		let bounds: Vec<DateBound> =
			serde_json::from_str(r#"[1700000000, "2024-01-01"]"#).expect("Bounds should parse.");

		assert_eq!(bounds, vec![DateBound::Unix(1_700_000_000), DateBound::from("2024-01-01")]);
	}
}
