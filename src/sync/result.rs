//! Aggregation outcome.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, error::DomainFetchError, provider::{DataDomain, ProviderKind}};

/// Snapshot assembled from one aggregation run.
///
/// Every requested domain has exactly one entry in [`AggregationResult::data`]: the decoded
/// payload, or `None` when the domain was unavailable. The cause of each `None` stays available
/// through [`AggregationResult::failure`] but is never serialized.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
	provider: ProviderKind,
	data: BTreeMap<DataDomain, Option<Value>>,
	#[serde(skip)]
	failures: BTreeMap<DataDomain, DomainFetchError>,
	#[serde(with = "time::serde::rfc3339")]
	synced_at: OffsetDateTime,
}
impl AggregationResult {
	pub(crate) fn assemble(
		provider: ProviderKind,
		outcomes: impl IntoIterator<Item = (DataDomain, Result<Value, DomainFetchError>)>,
	) -> Self {
		let mut data = BTreeMap::new();
		let mut failures = BTreeMap::new();

		for (domain, outcome) in outcomes {
			match outcome {
				Ok(payload) => {
					data.insert(domain, Some(payload));
				},
				Err(err) => {
					data.insert(domain, None);
					failures.insert(domain, err);
				},
			}
		}

		Self { provider, data, failures, synced_at: OffsetDateTime::now_utc() }
	}

	/// Provider the snapshot was fetched from.
	pub fn provider(&self) -> ProviderKind {
		self.provider
	}

	/// Per-domain payloads; `None` marks an unavailable domain.
	pub fn data(&self) -> &BTreeMap<DataDomain, Option<Value>> {
		&self.data
	}

	/// Payload for one domain, if it was fetched successfully.
	pub fn payload(&self, domain: DataDomain) -> Option<&Value> {
		self.data.get(&domain).and_then(Option::as_ref)
	}

	/// Why `domain` is unavailable, if it is.
	pub fn failure(&self, domain: DataDomain) -> Option<&DomainFetchError> {
		self.failures.get(&domain)
	}

	/// Number of domains that resolved to "unavailable".
	pub fn unavailable_count(&self) -> usize {
		self.failures.len()
	}

	/// Completion instant.
	pub fn synced_at(&self) -> OffsetDateTime {
		self.synced_at
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn serializes_nulls_and_labels() {
		let result = AggregationResult::assemble(
			ProviderKind::Garmin,
			[
				(DataDomain::HeartRate, Ok(json!([1, 2]))),
				(DataDomain::BodyBattery, Err(DomainFetchError::Status { status: 500 })),
			],
		);
		let value = serde_json::to_value(&result).expect("Result should serialize.");

		assert_eq!(value["provider"], "garmin");
		assert_eq!(value["data"], json!({ "heartRate": [1, 2], "bodyBattery": null }));
		assert!(value["syncedAt"].as_str().is_some_and(|stamp| stamp.ends_with('Z')));
		assert!(value.get("failures").is_none());
		assert!(matches!(
			result.failure(DataDomain::BodyBattery),
			Some(DomainFetchError::Status { status: 500 })
		));
		assert_eq!(result.unavailable_count(), 1);
	}
}
