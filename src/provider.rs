//! Provider-facing descriptors and data-domain routing.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering HTTPS-only endpoints,
//! the protocol family, client authentication preferences, and the fixed table of data-domain
//! routes. `domain` defines the [`DataDomain`] tags and how a date range is embedded per route.

pub mod descriptor;
pub mod domain;

pub use descriptor::*;
pub use domain::*;
