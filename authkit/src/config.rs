use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub jwt: JwtConfig,
    #[serde(default)]
    pub authenticator: AuthenticatorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    /// Registered claims a token must carry, e.g. `["exp", "sub"]`
    #[serde(default)]
    pub required_claims: Vec<String>,
    #[serde(default)]
    pub max_token_length: Option<usize>,
    #[serde(default = "default_leeway_seconds")]
    pub leeway_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthenticatorConfig {
    /// Response/request header carrying the token
    #[serde(default = "default_header_name")]
    pub header_name: String,
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: i64,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            expiration_hours: default_expiration_hours(),
        }
    }
}

fn default_leeway_seconds() -> u64 {
    60
}

fn default_header_name() -> String {
    "X-Auth-Token".to_string()
}

fn default_expiration_hours() -> i64 {
    12
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, AUTHENTICATOR__HEADER_NAME, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
