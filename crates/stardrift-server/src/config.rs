use serde::Deserialize;

use stardrift_core::universe::DEFAULT_MAX_PLAYERS;

/// Top-level server configuration, loaded from `stardrift.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    pub universes: UniversesConfig,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            web_root: "web".to_string(),
            universes: UniversesConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Universe sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UniversesConfig {
    /// Player slots per universe; a full universe spills the next
    /// connection into another one.
    pub max_players: usize,
}

impl Default for UniversesConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    /// Per-connection inbound message budget. Sized well above the
    /// per-frame input rate so gameplay is never throttled.
    pub ws_rate_limit_per_sec: f64,
    pub player_message_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            ws_rate_limit_per_sec: 120.0,
            player_message_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Validate configuration, exiting on fatal problems.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }
        if self.universes.max_players == 0 {
            tracing::error!("universes.max_players must be > 0");
            std::process::exit(1);
        }
        if self.limits.max_ws_connections == 0 {
            tracing::error!("limits.max_ws_connections must be > 0");
            std::process::exit(1);
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            tracing::error!("limits.ws_rate_limit_per_sec must be > 0");
            std::process::exit(1);
        }
        if self.limits.player_message_buffer == 0 {
            tracing::error!("limits.player_message_buffer must be > 0");
            std::process::exit(1);
        }
    }

    /// Load config from `stardrift.toml` if it exists, then apply env
    /// var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("stardrift.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from stardrift.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse stardrift.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No stardrift.toml found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("STARDRIFT_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(root) = std::env::var("STARDRIFT_WEB_ROOT")
            && !root.is_empty()
        {
            config.web_root = root;
        }
        if let Ok(val) = std::env::var("STARDRIFT_MAX_PLAYERS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.universes.max_players = n;
        }
        if let Ok(val) = std::env::var("STARDRIFT_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.limits.max_ws_connections = n;
        }
        if let Ok(val) = std::env::var("STARDRIFT_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            config.limits.ws_rate_limit_per_sec = n;
        }

        config
    }
}
