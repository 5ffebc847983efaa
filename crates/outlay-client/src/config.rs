//! Client configuration and loading
//!
//! Precedence: CLI args > environment variables > config file > defaults.
//! The config file itself is optional: with nothing present the client
//! points at the documented local-development API server.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use outlay_auth::endpoints::DEFAULT_API_BASE_URL;

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL all endpoint paths are joined onto
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout for the HTTP client
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Where the credential pair is persisted
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_credentials_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("outlay")
        .join("credentials.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout(),
            credentials_file: default_credentials_file(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    ///
    /// A missing file is not an error: defaults apply. OUTLAY_API_BASE_URL
    /// overrides the base URL either way, and validation runs on the final
    /// merged result.
    pub fn load(path: &Path) -> common::Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var("OUTLAY_API_BASE_URL") {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file path from a CLI argument or the
    /// OUTLAY_CONFIG environment variable, falling back to ./outlay.toml.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(path) = cli_path {
            return PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("OUTLAY_CONFIG") {
            return PathBuf::from(path);
        }
        PathBuf::from("outlay.toml")
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "api_base_url must start with http:// or https://, got: {}",
                self.api_base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) };
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("outlay.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        remove_env("OUTLAY_API_BASE_URL");

        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn loads_a_full_config_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        remove_env("OUTLAY_API_BASE_URL");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
api_base_url = "https://budget.example.com/api/"
timeout_secs = 10
credentials_file = "/tmp/outlay-test/credentials.json"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "https://budget.example.com/api/");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(
            config.credentials_file,
            PathBuf::from("/tmp/outlay-test/credentials.json")
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        remove_env("OUTLAY_API_BASE_URL");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"api_base_url = "http://10.0.0.5:8000/api/""#);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.5:8000/api/");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        remove_env("OUTLAY_API_BASE_URL");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "api_base_url = [not toml");

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn env_overrides_the_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_env("OUTLAY_API_BASE_URL", "http://override.example.com/api/");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"api_base_url = "http://file.example.com/api/""#);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "http://override.example.com/api/");

        remove_env("OUTLAY_API_BASE_URL");
    }

    #[test]
    fn blank_env_value_is_ignored() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_env("OUTLAY_API_BASE_URL", "   ");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"api_base_url = "http://file.example.com/api/""#);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "http://file.example.com/api/");

        remove_env("OUTLAY_API_BASE_URL");
    }

    #[test]
    fn env_override_is_validated() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_env("OUTLAY_API_BASE_URL", "ftp://wrong.example.com/");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"api_base_url = "http://file.example.com/api/""#);

        assert!(Config::load(&path).is_err());

        remove_env("OUTLAY_API_BASE_URL");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        remove_env("OUTLAY_API_BASE_URL");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"api_base_url = "budget.example.com""#);

        let err = Config::load(&path).unwrap_err();
        assert!(
            err.to_string().contains("http://"),
            "got: {err}"
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        remove_env("OUTLAY_API_BASE_URL");

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
api_base_url = "http://127.0.0.1:8000/api/"
timeout_secs = 0
"#,
        );

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn resolve_path_prefers_cli() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_env("OUTLAY_CONFIG", "/etc/outlay/env.toml");

        let path = Config::resolve_path(Some("/tmp/cli.toml"));
        assert_eq!(path, PathBuf::from("/tmp/cli.toml"));

        remove_env("OUTLAY_CONFIG");
    }

    #[test]
    fn resolve_path_falls_back_to_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_env("OUTLAY_CONFIG", "/etc/outlay/env.toml");

        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/etc/outlay/env.toml"));

        remove_env("OUTLAY_CONFIG");
    }

    #[test]
    fn resolve_path_defaults_to_cwd_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        remove_env("OUTLAY_CONFIG");

        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("outlay.toml"));
    }

    #[test]
    fn default_credentials_file_is_namespaced() {
        let config = Config::default();
        assert!(
            config.credentials_file.ends_with("outlay/credentials.json"),
            "got: {}",
            config.credentials_file.display()
        );
    }
}
