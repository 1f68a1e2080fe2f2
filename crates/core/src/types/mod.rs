//! Core types for QBridge OMS.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{MoneyParseError, money_to_cents};
pub use status::*;
