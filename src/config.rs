use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub host: String,
    pub port: u16,
    /// username -> password
    pub users: HashMap<String, String>,
    pub session_ttl: Duration,

    // Scraping
    pub export_dir: PathBuf,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let users = match get("AUTHORIZED_USERS") {
            Some(raw) => parse_users(&raw).context("AUTHORIZED_USERS")?,
            None => HashMap::new(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            users,
            session_ttl: Duration::from_secs(parse_or(&get, "SESSION_TTL_SECS", 12 * 3600)?),
            export_dir: get("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("exports")),
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?),
            user_agent: get("SCRAPER_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

/// `user:pass,user:pass`
fn parse_users(raw: &str) -> Result<HashMap<String, String>> {
    let mut users = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((user, pass)) = pair.split_once(':') else {
            bail!("expected user:password, got {pair:?}");
        };
        if user.is_empty() || pass.is_empty() {
            bail!("empty user or password in {pair:?}");
        }
        users.insert(user.to_string(), pass.to_string());
    }
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = load(&[]).unwrap();
        assert_eq!(c.port, 8080);
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.request_timeout, Duration::from_secs(30));
        assert_eq!(c.export_dir, PathBuf::from("exports"));
        assert!(c.users.is_empty());
        assert!(c.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn overrides() {
        let c = load(&[
            ("PORT", "9000"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("AUTHORIZED_USERS", "admin:s3cret, ops:pa:ss"),
            ("EXPORT_DIR", "/tmp/out"),
        ])
        .unwrap();
        assert_eq!(c.port, 9000);
        assert_eq!(c.request_timeout, Duration::from_secs(5));
        assert_eq!(c.users.get("admin").map(String::as_str), Some("s3cret"));
        assert_eq!(c.users.get("ops").map(String::as_str), Some("pa:ss"));
        assert_eq!(c.export_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("AUTHORIZED_USERS", "nopassword")]).is_err());
        assert!(load(&[("AUTHORIZED_USERS", ":x")]).is_err());
    }
}
