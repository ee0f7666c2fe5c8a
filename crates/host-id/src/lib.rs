//! Host Identity
//!
//! Resolves a stable, cloud-provider-assigned identity for the machine the
//! controller runs on.
//!
//! Currently only Azure is supported, through the instance metadata service.

pub mod azure;
pub mod error;

pub use azure::*;
pub use error::*;
