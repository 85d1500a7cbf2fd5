use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, Environment};
use palaver::relay::Pacing;
use serde::Deserialize;

use crate::error::{to_env_var, ConfigError};

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::MissingEnvVar {
                env_var: to_env_var("server.host"),
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_upstream_host")]
    pub host: String,
    /// Used when a request arrives without its own key.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        UpstreamSettings {
            host: default_upstream_host(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RelaySettings {
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        RelaySettings {
            chunk_chars: default_chunk_chars(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RelaySettings {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            chunk_chars: self.chunk_chars,
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub relay: RelaySettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PALAVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = match config.try_deserialize() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!("configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                return Err(ConfigError::Other(err));
            }
        };

        // requests may carry their own key; the environment supplies one for
        // clients that don't
        if settings.upstream.api_key.is_none() {
            settings.upstream.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        Ok(settings)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_upstream_host() -> String {
    "https://api.openai.com".to_string()
}

fn default_chunk_chars() -> usize {
    3
}

fn default_delay_ms() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("PALAVER_") {
                env::remove_var(&key);
            }
        }
        env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.upstream.host, "https://api.openai.com");
        assert_eq!(settings.upstream.api_key, None);
        assert_eq!(settings.relay.chunk_chars, 3);
        assert_eq!(settings.relay.delay_ms, 30);
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("PALAVER_SERVER__PORT", "8080");
        env::set_var("PALAVER_UPSTREAM__HOST", "http://localhost:11434");
        env::set_var("PALAVER_RELAY__CHUNK_CHARS", "8");
        env::set_var("PALAVER_RELAY__DELAY_MS", "5");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.upstream.host, "http://localhost:11434");
        assert_eq!(settings.relay.chunk_chars, 8);
        assert_eq!(settings.relay.delay_ms, 5);

        env::remove_var("PALAVER_SERVER__PORT");
        env::remove_var("PALAVER_UPSTREAM__HOST");
        env::remove_var("PALAVER_RELAY__CHUNK_CHARS");
        env::remove_var("PALAVER_RELAY__DELAY_MS");
    }

    #[test]
    #[serial]
    fn test_api_key_falls_back_to_openai_env() {
        clean_env();
        env::set_var("OPENAI_API_KEY", "sk-from-env");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.upstream.api_key.as_deref(), Some("sk-from-env"));

        env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }
}
