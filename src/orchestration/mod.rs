//! Orchestration layer for package registration
//!
//! This module provides the registration step and the classification of
//! failed requests.

pub mod failure;
pub mod registration_step;

pub use failure::{Classification, classify};
pub use registration_step::{PackageRegistrationStep, RegistrationOptions, RegistrationReport};
