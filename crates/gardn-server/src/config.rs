use gardn_game::bot::BotConfig;
use gardn_game::WorldConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    #[serde(default)]
    pub bots: BotsSection,
    #[serde(default)]
    pub world: WorldConfig,
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Simulation ticks per second.
    #[serde(default = "default_tps")]
    pub tps: u32,
    /// Seed for every random draw in the world.
    #[serde(default)]
    pub seed: u64,
    /// Seconds between status lines. 0 = disabled.
    #[serde(default = "default_summary_interval")]
    pub summary_interval_secs: u64,
}

fn default_tps() -> u32 {
    20
}

fn default_summary_interval() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct BotsSection {
    /// Bot population kept alive by the server.
    #[serde(default = "default_bot_count")]
    pub count: u32,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    /// Difficulty of the zone new bots appear in.
    #[serde(default)]
    pub spawn_difficulty: u32,
    #[serde(flatten)]
    pub engine: BotConfig,
}

fn default_bot_count() -> u32 {
    8
}

fn default_name_prefix() -> String {
    "Bot".into()
}

impl Default for BotsSection {
    fn default() -> Self {
        Self {
            count: default_bot_count(),
            name_prefix: default_name_prefix(),
            spawn_difficulty: 0,
            engine: BotConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Bot tuning with the tick rate taken from `[server]`.
    pub fn bot_config(&self) -> BotConfig {
        BotConfig {
            tps: self.server.tps,
            ..self.bots.engine.clone()
        }
    }
}
