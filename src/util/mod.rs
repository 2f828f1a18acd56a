//! Shared utility helpers.

pub mod error;
pub(crate) mod math;

pub use error::{GwBankError, GwBankResult};
pub use math::DYN_RANGE_FAC;
