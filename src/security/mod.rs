pub mod credentials;

pub use credentials::{ApiVersion, AuthContext, SecretMasker, mask_secret};
