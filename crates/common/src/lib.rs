//! Common types, protocol definitions, and errors shared across checkout crates.

pub mod checkout;
pub mod error;
pub mod protocol;

pub use checkout::{CheckoutPayload, Product};
pub use error::ServiceError;
