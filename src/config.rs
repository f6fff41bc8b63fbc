use std::{env, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub download_dir: PathBuf,
    pub workers: usize,
    pub queue_size: usize,
    pub archive_limit_mb: f64,
    pub scrape_timeout: Duration,
    pub yt_dlp_bin: String,
    pub spotdl_bin: String,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

/// Load `.env` into the process environment. A missing file is fine.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Err(e) if e.not_found() => Ok(()),
        Ok(_) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bot_token = var("BOT_TOKEN")
            .or_else(|| var("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let workers = parse_or("DOWNLOAD_WORKERS", var("DOWNLOAD_WORKERS"), 4_usize)?;
        let queue_size = parse_or("DOWNLOAD_QUEUE_SIZE", var("DOWNLOAD_QUEUE_SIZE"), 64_usize)?;
        let archive_limit_mb = parse_or("ARCHIVE_LIMIT_MB", var("ARCHIVE_LIMIT_MB"), 48.0_f64)?;
        let scrape_timeout_secs =
            parse_or("SCRAPE_TIMEOUT_SECS", var("SCRAPE_TIMEOUT_SECS"), 15_u64)?;

        if workers == 0 {
            return Err(invalid("DOWNLOAD_WORKERS", "0", "must be at least 1"));
        }
        if queue_size == 0 {
            return Err(invalid("DOWNLOAD_QUEUE_SIZE", "0", "must be at least 1"));
        }
        if !(archive_limit_mb.is_finite() && archive_limit_mb > 0.0) {
            return Err(invalid(
                "ARCHIVE_LIMIT_MB",
                &archive_limit_mb.to_string(),
                "must be a positive number",
            ));
        }

        Ok(Self {
            bot_token,
            download_dir: var("DOWNLOAD_DIR").map_or_else(|| PathBuf::from("downloads"), PathBuf::from),
            workers,
            queue_size,
            archive_limit_mb,
            scrape_timeout: Duration::from_secs(scrape_timeout_secs),
            yt_dlp_bin: var("YT_DLP_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            spotdl_bin: var("SPOTDL_BIN").unwrap_or_else(|| "spotdl".to_string()),
            spotify_client_id: var("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: var("SPOTIFY_CLIENT_SECRET"),
        })
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &v, &e.to_string())),
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("BOT_TOKEN", "123:abc")]).expect("config");

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_size, 64);
        assert!((config.archive_limit_mb - 48.0).abs() < f64::EPSILON);
        assert_eq!(config.scrape_timeout, Duration::from_secs(15));
        assert_eq!(config.yt_dlp_bin, "yt-dlp");
        assert!(config.spotify_client_id.is_none());
    }

    #[test]
    fn teloxide_token_is_a_fallback() {
        let config = load(&[("TELOXIDE_TOKEN", "t")]).expect("config");
        assert_eq!(config.bot_token, "t");
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("BOT_TOKEN"))));
    }

    #[test]
    fn rejects_zero_workers() {
        let err = load(&[("BOT_TOKEN", "t"), ("DOWNLOAD_WORKERS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DOWNLOAD_WORKERS", .. }));
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = load(&[("BOT_TOKEN", "t"), ("ARCHIVE_LIMIT_MB", "lots")]).unwrap_err();
        assert!(err.to_string().contains("ARCHIVE_LIMIT_MB"));
    }
}
