//! Environment configuration, deserialized through `serde`.
//!
//! As with the [`envy`] crate, the process environment is handed to serde as a map of strings,
//! so `rename` and `default` attributes work as they would for any other format. Every field is
//! a string on the wire; the port is parsed by its own `deserialize_with` hook.
//!
//! [`envy`]: https://github.com/softprops/envy

use serde::de::value::MapDeserializer;
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5454;
pub const DEFAULT_DATABASE_PATH: &str = "scores.db";
pub const DEFAULT_INDEX_PATH: &str = "index.html";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Env {
    /// Path prefix prepended to every route; empty serves from the root.
    #[serde(default)]
    pub mount: String,
    /// Unset or blank falls back to [`DEFAULT_PORT`].
    #[serde(default = "default_port", deserialize_with = "port_or_default")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Env {
    /// Loads `.env` (if one exists in the working directory) and reads the process environment.
    pub fn new() -> EnvResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => (),
            Err(e) => return Err(e.into()),
        }

        Ok(from_env::<Env>()?.normalized())
    }

    fn normalized(mut self) -> Self {
        self.mount = normalize_mount(&self.mount);
        self
    }
}

impl Default for Env {
    fn default() -> Self {
        Self {
            mount: String::new(),
            port: default_port(),
            database_path: default_database_path(),
            index_path: default_index_path(),
        }
    }
}

#[inline]
const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn port_or_default<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_PORT);
    }

    raw.parse::<u16>()
        .map_err(|e| de::Error::custom(format_args!("invalid PORT '{raw}': {e}")))
}

#[inline]
fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

#[inline]
fn default_index_path() -> String {
    DEFAULT_INDEX_PATH.to_string()
}

/// Turns a user-supplied mount prefix into something that can be glued in front of a route:
/// either empty, or starting with `/` and never ending with one.
pub fn normalize_mount(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

pub fn from_env<T>() -> Result<T, EnvDeserializeError>
where
    T: serde::de::DeserializeOwned,
{
    from_iter(dotenvy::vars())
}

pub fn from_iter<Iter, T>(iter: Iter) -> Result<T, EnvDeserializeError>
where
    T: serde::de::DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    T::deserialize(MapDeserializer::<_, EnvDeserializeError>::new(
        iter.into_iter(),
    ))
}

impl de::Error for EnvDeserializeError {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        EnvDeserializeError::Custom(msg.to_string())
    }
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error(transparent)]
    DeserializationError(#[from] EnvDeserializeError),
}

#[derive(Debug, Error)]
pub enum EnvDeserializeError {
    #[error("env deserialization error: {0}")]
    Custom(String),
}
