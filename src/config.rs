use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub gateway: GatewayConfig,
    pub call: CallDefaults,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    /// NATS URL of the remote data gateway
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallDefaults {
    /// STUN endpoints handed to every peer connection (no TURN)
    pub stun_servers: Vec<String>,

    /// Stand-in for the signaling acknowledgment, in milliseconds
    pub connect_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Guest mode: conversations come from the local mock seed, no gateway
    pub guest: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
