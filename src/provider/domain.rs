//! Data-domain tags and per-provider route definitions.

// self
use crate::{_prelude::*, error::ConfigError, sync::DateRange};

/// Category of health data fetched through its own upstream endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataDomain {
	/// Sleep sessions.
	Sleep,
	/// Heart-rate samples.
	HeartRate,
	/// Stress scores.
	Stress,
	/// Garmin Body Battery levels.
	BodyBattery,
	/// Daily step counts.
	Steps,
	/// WHOOP recovery scores.
	Recovery,
	/// Workouts.
	Workout,
	/// WHOOP physiological cycles (strain).
	Cycle,
	/// Basic user profile.
	Profile,
}
impl DataDomain {
	/// Returns the wire label used as the key in aggregation results.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Sleep => "sleep",
			Self::HeartRate => "heartRate",
			Self::Stress => "stress",
			Self::BodyBattery => "bodyBattery",
			Self::Steps => "steps",
			Self::Recovery => "recovery",
			Self::Workout => "workout",
			Self::Cycle => "cycle",
			Self::Profile => "profile",
		}
	}
}
impl Display for DataDomain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a route embeds the requested date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateWindow {
	/// The endpoint takes no date range.
	Unbounded,
	/// Start/end as Unix seconds in the named query parameters.
	UnixSeconds {
		/// Query parameter for the start bound.
		start: &'static str,
		/// Query parameter for the end bound.
		end: &'static str,
	},
	/// Start/end as RFC 3339 timestamps in the named query parameters.
	Rfc3339 {
		/// Query parameter for the start bound.
		start: &'static str,
		/// Query parameter for the end bound.
		end: &'static str,
	},
}
impl DateWindow {
	/// Garmin wellness upload window.
	pub const UPLOAD_SECONDS: Self =
		Self::UnixSeconds { start: "uploadStartTimeInSeconds", end: "uploadEndTimeInSeconds" };
	/// WHOOP collection window.
	pub const START_END: Self = Self::Rfc3339 { start: "start", end: "end" };

	/// Query pairs carrying `range`.
	pub fn query_pairs(self, range: &DateRange) -> Vec<(&'static str, String)> {
		match self {
			Self::Unbounded => Vec::new(),
			Self::UnixSeconds { start, end } => vec![
				(start, range.start().unix_timestamp().to_string()),
				(end, range.end().unix_timestamp().to_string()),
			],
			Self::Rfc3339 { start, end } =>
				vec![(start, range.start_rfc3339()), (end, range.end_rfc3339())],
		}
	}
}

/// Endpoint path serving one data domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainRoute {
	/// Domain the route serves.
	pub domain: DataDomain,
	/// Path appended to the provider's API base URL.
	pub path: String,
	/// Date-range encoding.
	pub window: DateWindow,
}
impl DomainRoute {
	/// Creates a route.
	pub fn new(domain: DataDomain, path: impl Into<String>, window: DateWindow) -> Self {
		Self { domain, path: path.into(), window }
	}

	/// Full request URL under `api_base` with the date window in the query.
	///
	/// The path is appended to the base rather than resolved against it, so bases with a path
	/// prefix (`/developer/v1`) keep it.
	pub fn url(&self, api_base: &Url, range: &DateRange) -> Result<Url> {
		let joined = format!(
			"{}/{}",
			api_base.as_str().trim_end_matches('/'),
			self.path.trim_start_matches('/')
		);
		let mut url =
			Url::parse(&joined).map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let pairs = self.window.query_pairs(range);

		if !pairs.is_empty() {
			let mut query = url.query_pairs_mut();

			for (key, value) in &pairs {
				query.append_pair(key, value);
			}
		}

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn range() -> DateRange {
		DateRange::from_unix(1_700_000_000, 1_700_086_400).expect("Fixture range should be valid.")
	}

	#[test]
	fn labels_match_serde_names() {
		for domain in [DataDomain::HeartRate, DataDomain::BodyBattery, DataDomain::Profile] {
			let json = serde_json::to_string(&domain).expect("Domain should serialize.");

			assert_eq!(json, format!("\"{}\"", domain.as_str()));
		}
	}

	#[test]
	fn unix_window_renders_seconds() {
		let base = Url::parse("https://apis.garmin.com").expect("Base URL should parse.");
		let url = DomainRoute::new(
			DataDomain::Stress,
			"/wellness-api/rest/stress",
			DateWindow::UPLOAD_SECONDS,
		)
		.url(&base, &range())
		.expect("Route URL should build.");

		assert_eq!(
			url.as_str(),
			"https://apis.garmin.com/wellness-api/rest/stress?uploadStartTimeInSeconds=1700000000&uploadEndTimeInSeconds=1700086400"
		);
	}

	#[test]
	fn base_path_prefix_is_preserved() {
		let base =
			Url::parse("https://api.prod.whoop.com/developer/v1").expect("Base URL should parse.");
		let profile = DomainRoute::new(DataDomain::Profile, "/user/profile/basic", DateWindow::Unbounded)
			.url(&base, &range())
			.expect("Route URL should build.");
		let cycle = DomainRoute::new(DataDomain::Cycle, "/cycle", DateWindow::START_END)
			.url(&base, &range())
			.expect("Route URL should build.");
		let pairs: HashMap<_, _> = cycle.query_pairs().into_owned().collect();

		assert_eq!(profile.as_str(), "https://api.prod.whoop.com/developer/v1/user/profile/basic");
		assert_eq!(cycle.path(), "/developer/v1/cycle");
		assert_eq!(pairs.get("start").map(String::as_str), Some("2023-11-14T22:13:20Z"));
		assert_eq!(pairs.get("end").map(String::as_str), Some("2023-11-15T22:13:20Z"));
	}
}
