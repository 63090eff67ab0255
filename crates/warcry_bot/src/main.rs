#[macro_use]
extern crate tracing;

mod config;
mod model;
mod permission;
mod plugin;
mod state;
mod store;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use warcry::{bot::Bot, schema::intents};

use crate::{config::BotConfig, permission::Permissions, state::State, store::Store};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    // reqwest 与 tungstenite 共用 rustls，需要先选定加密后端
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = BotConfig::from_env()?;
    let store = Store::open(&config.data_dir).await?;
    info!("Ledgers stored in {}", config.data_dir.display());
    let state = Arc::new(State::new(
        store,
        Permissions::new(&config.leader_role, &config.member_role),
    ));

    let mut bot_instance = Bot::new(
        &config.token,
        intents::GUILDS
            | intents::GUILD_MEMBERS
            | intents::GUILD_MESSAGES
            | intents::GUILD_MESSAGE_REACTIONS
            | intents::MESSAGE_CONTENT,
        &config.prefix,
    )?;
    bot_instance.use_builtin_handler();
    bot_instance.register_plugin(plugin::ban_plugin(state.clone()));
    bot_instance.register_plugin(plugin::fine_plugin(state.clone()));
    bot_instance.register_plugin(plugin::score_plugin(state.clone()));
    bot_instance.register_plugin(plugin::party_plugin(state.clone()));
    bot_instance.register_plugin(plugin::history_plugin(state.clone()));
    bot_instance.register_plugin(plugin::prefix_plugin(state.clone()));
    bot_instance.register_plugin(plugin::pager_plugin(state));
    bot_instance.start().await
}
