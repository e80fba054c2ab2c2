use crate::{ConfigError, FromEnv, env_parse_or_default};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Listen address for the HTTP server (`HOST`, `PORT`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 8080;

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: Self::DEFAULT_PORT,
        }
    }
}

impl FromEnv for ServerConfig {
    /// Host must be an IP literal; hostnames are rejected at startup rather
    /// than at bind time.
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: env_parse_or_default("HOST", defaults.host)?,
            port: env_parse_or_default("PORT", defaults.port)?,
        })
    }
}
