//! Environment-based configuration
//!
//! Everything is read once at startup from the environment (a `.env` file is
//! honored) and validated before anything else is built. Nothing here is
//! mutable at runtime.

use std::fmt;
use std::path::PathBuf;

use catalog::MediaRoot;

const DEFAULT_PORT: u16 = 8035;
/// 10 MiB/s shared across all active downloads
const DEFAULT_BANDWIDTH_LIMIT: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_CONCURRENT: usize = 3;
/// 8 KiB read chunks
const DEFAULT_CHUNK_SIZE: usize = 8192;
const DEFAULT_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts",
];

/// Custom error type for configuration problems; always fatal at startup
#[derive(Debug)]
pub enum ConfigError {
    /// Neither MOVIES_PATH nor TV_SHOWS_PATH is set
    NoMediaRoots,
    /// A variable is present but unparseable or out of range
    Invalid { name: &'static str, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoMediaRoots => {
                write!(f, "at least one of MOVIES_PATH or TV_SHOWS_PATH must be set")
            }
            ConfigError::Invalid { name, message } => {
                write!(f, "invalid {}: {}", name, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration, fixed at process start
#[derive(Debug, Clone)]
pub struct Config {
    pub movies_path: Option<PathBuf>,
    pub tv_shows_path: Option<PathBuf>,
    pub port: u16,
    /// Total allowed throughput in bytes per second
    pub bandwidth_limit: u64,
    pub max_concurrent_downloads: usize,
    /// Streaming read size in bytes
    pub chunk_size: usize,
    /// Lowercased extension filter; empty means allow everything
    pub allowed_extensions: Vec<String>,
}

impl Config {
    /// Load and validate configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let movies_path = env_path("MOVIES_PATH");
        let tv_shows_path = env_path("TV_SHOWS_PATH");
        if movies_path.is_none() && tv_shows_path.is_none() {
            return Err(ConfigError::NoMediaRoots);
        }

        let config = Config {
            movies_path,
            tv_shows_path,
            port: env_parse("PORT", DEFAULT_PORT)?,
            bandwidth_limit: env_parse("BANDWIDTH_LIMIT", DEFAULT_BANDWIDTH_LIMIT)?,
            max_concurrent_downloads: env_parse("MAX_CONCURRENT_DOWNLOADS", DEFAULT_MAX_CONCURRENT)?,
            chunk_size: env_parse("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            allowed_extensions: match std::env::var("ALLOWED_EXTENSIONS") {
                Ok(raw) => parse_extensions(&raw),
                Err(_) => DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bandwidth_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "BANDWIDTH_LIMIT",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_concurrent_downloads == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_CONCURRENT_DOWNLOADS",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                name: "CHUNK_SIZE",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Library roots with their display categories
    pub fn media_roots(&self) -> Vec<MediaRoot> {
        let mut roots = Vec::new();
        if let Some(path) = &self.movies_path {
            roots.push(MediaRoot::new(path.clone(), "Movie"));
        }
        if let Some(path) = &self.tv_shows_path {
            roots.push(MediaRoot::new(path.clone(), "TV Show"));
        }
        roots
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

fn env_parse<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            message: format!("{:?}: {}", raw, e),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated extension list; entries are trimmed, lowercased
/// and stripped of a leading dot. An empty value means allow everything.
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            movies_path: Some(PathBuf::from("/media/movies")),
            tv_shows_path: None,
            port: DEFAULT_PORT,
            bandwidth_limit: DEFAULT_BANDWIDTH_LIMIT,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            allowed_extensions: vec![],
        }
    }

    #[test]
    fn test_parse_extensions() {
        assert_eq!(
            parse_extensions("mp4, .MKV ,avi"),
            vec!["mp4".to_string(), "mkv".to_string(), "avi".to_string()]
        );
    }

    #[test]
    fn test_parse_extensions_empty_means_allow_all() {
        assert!(parse_extensions("").is_empty());
        assert!(parse_extensions(" , ,").is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_bandwidth() {
        let config = Config {
            bandwidth_limit: 0,
            ..base_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "BANDWIDTH_LIMIT", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let config = Config {
            max_concurrent_downloads: 0,
            ..base_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let config = Config {
            chunk_size: 0,
            ..base_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_media_roots_categories() {
        let config = Config {
            tv_shows_path: Some(PathBuf::from("/media/shows")),
            ..base_config()
        };
        let roots = config.media_roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].category, "Movie");
        assert_eq!(roots[1].category, "TV Show");
    }
}
