//! Shared primitives for the molprint workspace.
//!
//! - **Error types**: [`MolprintError`] and [`Result`] for structured error handling
//! - **Traits**: [`Annotated`], [`Summarizable`] and [`ContentAddressable`]

pub mod error;
pub mod traits;

pub use error::{MolprintError, Result};
pub use traits::*;
