pub mod config;
pub mod error;
pub mod payload;
pub mod reporter;
pub mod safe_json;
pub mod traits;

pub use config::{EnvConfigReader, LayeredConfigReader, MapConfigReader, RegistrationInputs};
pub use error::*;
pub use payload::{PipelineContext, RegistrationPayload};
pub use reporter::ActionsReporter;
pub use traits::*;
