use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `POLAR__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "POLAR";
const DEFAULT_FILE: &str = "server";

#[polar_derive::polar_error]
pub enum ConfigError {
    #[kind(Malformed)]
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration structure from a file plus environment overrides.
///
/// 1. **Base File**: `path` (any format the `config` crate understands, e.g. `server.toml`).
///    When `path` is `None` the loader looks for `server.*` in the working directory and
///    falls back to the structure's defaults if nothing is there.
/// 2. **Environment Overrides**: variables prefixed with `POLAR__`. Nested keys use double
///    underscores, so `POLAR__DATABASE__URL` maps to `database.url`.
///    `POLAR__SERVER__CORS__ALLOWED_ORIGINS` takes a comma separated list.
///
/// # Errors
/// * An explicit `path` that does not exist.
/// * Values that do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use polar_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    build(path.map(|p| p.as_ref().to_path_buf()), None)
}

/// Same as [`load_config`] but reads overrides from `env` instead of the process environment.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    env: Map<String, String>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    build(path.map(|p| p.as_ref().to_path_buf()), Some(env))
}

fn build<T>(path: Option<PathBuf>, env: Option<Map<String, String>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("server.cors.allowed_origins")
                .source(env),
        );

    info!("Loading config from {}", effective_path.display());

    builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
