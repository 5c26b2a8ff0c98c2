use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Domino pairs scoreboard server
#[derive(Parser, Debug, Clone)]
#[command(name = "domino-scoreboard", version, about)]
pub struct Config {
    /// Address the scoreboard page listens on
    #[arg(long, env = "SCOREBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Quick-add buttons shown for each team (comma separated)
    #[arg(
        long,
        env = "ADD_AMOUNTS",
        value_delimiter = ',',
        default_values_t = [5u32, 10, 15, 20]
    )]
    pub add_amounts: Vec<u32>,

    /// Subtract buttons shown for each team (comma separated)
    #[arg(
        long,
        env = "SUBTRACT_AMOUNTS",
        value_delimiter = ',',
        default_values_t = [5u32]
    )]
    pub subtract_amounts: Vec<u32>,

    /// Maximum number of live scoreboard sessions
    #[arg(long, env = "MAX_SESSIONS", default_value = "1000")]
    pub max_sessions: usize,

    /// Seconds a session may sit idle before it is dropped
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "21600")]
    pub session_ttl_secs: u64,

    /// How often idle sessions are swept, in seconds
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value = "60")]
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.socket_addr()?;
        if self.add_amounts.is_empty() {
            anyhow::bail!("add_amounts must list at least one amount");
        }
        if self.subtract_amounts.is_empty() {
            anyhow::bail!("subtract_amounts must list at least one amount");
        }
        if self
            .add_amounts
            .iter()
            .chain(&self.subtract_amounts)
            .any(|&a| a == 0)
        {
            anyhow::bail!("button amounts must be positive");
        }
        if self.max_sessions == 0 {
            anyhow::bail!("max_sessions must be positive");
        }
        if self.session_ttl_secs == 0 {
            anyhow::bail!("session_ttl_secs must be positive");
        }
        if self.sweep_interval_secs == 0 {
            anyhow::bail!("sweep_interval_secs must be positive");
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen_addr '{}': {}", self.listen_addr, e))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
