pub mod core;
pub mod orchestration;
pub mod security;
pub mod transport;

pub use crate::core::*;
pub use orchestration::{PackageRegistrationStep, RegistrationOptions, RegistrationReport};
pub use security::{AuthContext, SecretMasker};
pub use transport::HttpRegistrationClient;
