pub use crate::config::{ConfigError, ConfigErrorExt, load_config};
pub use crate::server::{ApiError, ApiState, ApiStateError, ErrorBody};
pub use polar_domain::ErrorKind;
pub use polar_domain::config::ApiConfig;
pub use polar_domain::registry::{FeatureSlice, InitializedSlice};
