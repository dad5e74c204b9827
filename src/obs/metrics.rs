// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"fitsync_broker_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts one sync domain outcome (`ok` or `unavailable`) via the global metrics recorder.
pub fn record_domain_outcome(provider: &'static str, domain: &'static str, ok: bool) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"fitsync_broker_domain_total",
			"provider" => provider,
			"domain" => domain,
			"outcome" => if ok { "ok" } else { "unavailable" }
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (provider, domain, ok);
	}
}
