use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub leader_role: String,
    pub member_role: String,
    pub data_dir: PathBuf,
}

impl BotConfig {
    /// 从环境变量（以及 `.env` 文件）读取配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        Ok(Self {
            token: lookup("DISCORD_TOKEN")
                .filter(|token| !token.trim().is_empty())
                .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?,
            prefix: var("BOT_PREFIX", "!"),
            leader_role: var("LEADER_ROLE", "Party Leader"),
            member_role: var("MEMBER_ROLE", "Member"),
            data_dir: PathBuf::from(var("DATA_DIR", ".")),
        })
    }
}
