use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Pinboard collaboration server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "pinboard-server", version, about = "Pinboard collaboration server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PINBOARD_PORT", default_value = "8000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "PINBOARD_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./pinboard.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "PINBOARD_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Allowed CORS origins (comma-separated)
    #[arg(
        long,
        env = "PINBOARD_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub cors_origins: Vec<String>,

    /// Maximum inbound WebSocket message size in bytes
    #[arg(long, env = "PINBOARD_MAX_MESSAGE_BYTES", default_value = "65536")]
    pub max_message_bytes: usize,

    /// Capacity of each connection's outbound event queue.
    /// A recipient whose queue fills up is force-disconnected so a stalled
    /// client cannot stall the rest of the room.
    #[arg(long, env = "PINBOARD_OUTBOUND_QUEUE", default_value = "128")]
    pub outbound_queue: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            config: "./pinboard.toml".to_string(),
            json_logs: false,
            generate_config: false,
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_message_bytes: 65536,
            outbound_queue: 128,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (PINBOARD_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("PINBOARD_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Pinboard Collaboration Server Configuration
# Place this file at ./pinboard.toml or specify with --config <path>
# All settings can be overridden via environment variables (PINBOARD_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 8000)
# port = 8000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Allowed CORS origins for the REST API
# cors_origins = ["http://localhost:3000"]

# Maximum inbound WebSocket message size in bytes (default: 65536 = 64 KiB)
# max_message_bytes = 65536

# Outbound event queue capacity per connection (default: 128)
# A client whose queue overflows is disconnected rather than allowed to
# stall broadcasts to the rest of its room.
# outbound_queue = 128
"#
    .to_string()
}
