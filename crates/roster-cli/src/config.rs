//! Settings: CLI flags and env vars override the optional TOML file, which
//! overrides the defaults.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use roster_core::session::{Session, SessionCredential};
use serde::Deserialize;

pub const DEFAULT_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shape of the optional TOML config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
  #[serde(default)]
  pub url:          String,
  #[serde(default)]
  pub token:        String,
  #[serde(default)]
  pub username:     String,
  pub timeout_secs: Option<u64>,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default)]
pub struct Overrides {
  pub url:          Option<String>,
  pub token:        Option<String>,
  pub user:         Option<String>,
  pub timeout_secs: Option<u64>,
}

#[derive(Debug)]
pub struct Settings {
  pub base_url: String,
  pub session:  Session,
  pub timeout:  Duration,
}

/// Read the config file at `path`, or an empty one if no path was given.
pub fn load_file(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let path = expand_tilde(path);
  let raw = std::fs::read_to_string(&path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

fn non_empty(s: String) -> Option<String> {
  (!s.trim().is_empty()).then_some(s)
}

pub fn resolve(overrides: Overrides, file: ConfigFile) -> Settings {
  let base_url = overrides
    .url
    .and_then(non_empty)
    .or_else(|| non_empty(file.url))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let token = overrides.token.and_then(non_empty).or_else(|| non_empty(file.token));
  let identity = overrides
    .user
    .and_then(non_empty)
    .or_else(|| non_empty(file.username))
    .unwrap_or_default();
  let timeout_secs = overrides
    .timeout_secs
    .or(file.timeout_secs)
    .unwrap_or(DEFAULT_TIMEOUT_SECS);

  let session = match token {
    Some(token) => Session::signed_in(SessionCredential::new(token.trim(), identity)),
    None => Session::anonymous(),
  };

  Settings {
    base_url,
    session,
    timeout: Duration::from_secs(timeout_secs),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_without_anything() {
    let settings = resolve(Overrides::default(), ConfigFile::default());
    assert_eq!(settings.base_url, DEFAULT_URL);
    assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert!(!settings.session.is_signed_in());
  }

  #[test]
  fn flags_override_file() {
    let file: ConfigFile = toml::from_str(
      r#"
        url = "http://file:8080"
        token = "file-token"
        username = "filer"
        timeout_secs = 5
      "#,
    )
    .unwrap();
    let settings = resolve(
      Overrides {
        url: Some("http://flag:9090".into()),
        token: Some("flag-token".into()),
        ..Overrides::default()
      },
      file,
    );

    assert_eq!(settings.base_url, "http://flag:9090");
    assert_eq!(settings.timeout, Duration::from_secs(5));
    let cred = settings.session.credential().unwrap();
    assert_eq!(cred.bearer(), "flag-token");
    assert_eq!(cred.identity(), "filer");
  }

  #[test]
  fn blank_token_means_signed_out() {
    let settings = resolve(
      Overrides { token: Some("   ".into()), ..Overrides::default() },
      ConfigFile::default(),
    );
    assert!(!settings.session.is_signed_in());
  }

  #[test]
  fn missing_file_path_yields_empty_config() {
    let file = load_file(None).unwrap();
    assert!(file.url.is_empty());
    assert!(file.timeout_secs.is_none());
  }

  #[test]
  fn unreadable_file_is_an_error() {
    assert!(load_file(Some(Path::new("/nonexistent/roster.toml"))).is_err());
  }
}
