//! Common types, traits, and error definitions for trolley_sim
//!
//! This module provides the foundational building blocks used across
//! the motion models, paths and controllers.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
