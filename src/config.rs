// Server configuration, from flags or the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::coach::{CoachConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::session::DEFAULT_MAX_SESSIONS;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "ECOINVEST_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "ECOINVEST_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Transactions CSV used for the footprint baseline
    #[arg(long, env = "ECOINVEST_DATASET")]
    pub dataset: Option<PathBuf>,

    /// API key for the text-generation service (blank disables live generation)
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible chat-completions URL
    #[arg(long, env = "ECOINVEST_LLM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub llm_endpoint: String,

    #[arg(long, env = "ECOINVEST_LLM_MODEL", default_value = DEFAULT_MODEL)]
    pub llm_model: String,

    /// Timeout for a single generation request, in seconds
    #[arg(long, env = "ECOINVEST_LLM_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub llm_timeout_secs: u64,

    /// Sessions kept in memory before the least recently used is evicted
    #[arg(long, env = "ECOINVEST_MAX_SESSIONS", default_value_t = DEFAULT_MAX_SESSIONS)]
    pub max_sessions: usize,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            dataset: None,
            api_key: None,
            llm_endpoint: DEFAULT_ENDPOINT.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            llm_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServeArgs {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn coach_config(&self) -> CoachConfig {
        CoachConfig {
            api_key: non_blank(self.api_key.as_deref()),
            endpoint: self.llm_endpoint.trim().to_string(),
            model: self.llm_model.trim().to_string(),
            timeout: Duration::from_secs(self.llm_timeout_secs.max(1)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
