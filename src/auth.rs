//! Credential models handed out by negotiation and consumed by sync.

pub mod credential;
pub mod scope;
pub mod token;

pub use credential::*;
pub use scope::*;
pub use token::{bearer::*, secret::*};
