use clap::{Parser, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use suse_obs_core::backend::{TokenKind, Url};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(name = "suse-obs-mcpd", version, about = "SUSE Observability MCP daemon.")]
struct CliArgs {
    #[arg(long, env = "SUSE_OBS_URL", default_value = "")]
    url: String,

    #[arg(long, env = "SUSE_OBS_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    #[arg(
        long,
        env = "SUSE_OBS_API_TOKEN",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    api_token: bool,

    #[arg(long = "http", env = "SUSE_OBS_MCP_HTTP_ADDR")]
    http_addr: Option<SocketAddr>,

    #[arg(
        long,
        env = "SUSE_OBS_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long,
        env = "SUSE_OBS_MCP_STATELESS",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    stateless: bool,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone)]
pub struct ObsConfig {
    pub url: Url,
    pub token: String,
    pub token_kind: TokenKind,
    pub http_addr: Option<SocketAddr>,
    pub request_timeout: Duration,
    pub stateless: bool,
}

impl fmt::Debug for ObsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsConfig")
            .field("url", &self.url.as_str())
            .field("token", &"<redacted>")
            .field("token_kind", &self.token_kind)
            .field("http_addr", &self.http_addr)
            .field("request_timeout", &self.request_timeout)
            .field("stateless", &self.stateless)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl ObsConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for ObsConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let raw_url = args.url.trim();
        if raw_url.is_empty() {
            return Err(ConfigError::MissingSetting("SUSE_OBS_URL"));
        }
        let token = args.token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingSetting("SUSE_OBS_TOKEN"));
        }

        let url = Url::parse(raw_url).map_err(|_| ConfigError::InvalidSetting {
            name: "SUSE_OBS_URL",
            value: raw_url.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidSetting {
                name: "SUSE_OBS_URL",
                value: raw_url.to_string(),
            });
        }

        if args.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "SUSE_OBS_REQUEST_TIMEOUT_SECS",
                value: args.request_timeout_secs.to_string(),
            });
        }

        let token_kind = if args.api_token {
            TokenKind::Api
        } else {
            TokenKind::Service
        };

        Ok(Self {
            url,
            token: token.to_string(),
            token_kind,
            http_addr: args.http_addr,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            stateless: args.stateless,
        })
    }
}
