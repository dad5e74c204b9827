//! Token value types.

pub mod bearer;
pub mod secret;
