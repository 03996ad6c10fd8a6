//! Kernel utilities shared by every slice and the server binary.
//!
//! * [`config::load_config`] layers a TOML file with `POLAR__*` environment overrides.
//! * [`server::ApiState`] carries the configuration and the registry of initialized
//!   feature slices into axum handlers.
//! * [`server::ApiError`] turns any classified failure into a JSON error response.
//!
//! ```rust,ignore
//! use polar_kernel::config::load_config;
//! use polar_kernel::domain::config::ApiConfig;
//!
//! let cfg: ApiConfig = load_config(Some("server"))?;
//! ```
pub mod config;
pub mod prelude;
pub mod server;

pub use polar_domain as domain;
