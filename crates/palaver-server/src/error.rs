use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration: set the {env_var} environment variable")]
    MissingEnvVar { env_var: String },

    #[error("configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings path to the environment variable that supplies it,
/// e.g. `upstream.host` -> `PALAVER_UPSTREAM__HOST`.
pub fn to_env_var(field: &str) -> String {
    format!("PALAVER_{}", field.replace('.', "__").to_uppercase())
}
