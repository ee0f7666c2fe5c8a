//! Errors raised while deriving metrics from a single resource object.
//!
//! These never abort a batch: the cache logs them and skips the object.

use crate::kind::ResourceKind;
use thiserror::Error;

/// Errors that can occur while deriving a record from a resource object.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// A field the derivation depends on is absent
    #[error("{kind} object is missing required field {field}")]
    MissingField {
        /// Kind of the offending object
        kind: ResourceKind,
        /// Dotted path of the missing field
        field: &'static str,
    },

    /// The handler for one kind was handed an object of another kind
    #[error("handler for {expected} received a {found} object")]
    KindMismatch {
        /// Kind the handler derives
        expected: ResourceKind,
        /// Kind of the object received
        found: ResourceKind,
    },

    /// A resource quantity string could not be parsed
    #[error("invalid quantity {0:?}")]
    InvalidQuantity(String),
}
