use std::{env, net::SocketAddr};

use crate::charts::ChartSize;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub chart_size: ChartSize,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            chart_size: ChartSize::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read `STATS_ADDR`, `STATS_CHART_WIDTH`, `STATS_CHART_HEIGHT` and
    /// `STATS_MAX_BODY_BYTES`. Unset or unparsable values fall back to the
    /// defaults, only a malformed address is an error.
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        let defaults = Self::default();
        let addr = env::var("STATS_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse()?;
        Ok(Self {
            addr,
            chart_size: ChartSize {
                width: env_var_u32("STATS_CHART_WIDTH", defaults.chart_size.width),
                height: env_var_u32("STATS_CHART_HEIGHT", defaults.chart_size.height),
            },
            max_body_bytes: env_var_usize("STATS_MAX_BODY_BYTES", defaults.max_body_bytes),
        })
    }
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}
