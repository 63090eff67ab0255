use std::{borrow::Cow, future::Future};

use anyhow::Result;

use crate::{
    adapter::{self, Adapter},
    chain::{Context, Matcher, Prefix, Rule},
    plugin::Plugin,
    schema::{Embed, color},
};

pub struct Bot {
    adapter: Box<dyn Adapter>,
    plugins: Vec<Plugin>,
    prefix: Prefix,
}

impl Bot {
    pub fn new(token: &str, intents: u64, prefix: impl Into<String>) -> Result<Self> {
        Ok(Bot {
            adapter: adapter::GatewayAdapter::new(token, intents)?,
            plugins: vec![Plugin::new("Builtin", "Handlers registered directly on the bot")],
            prefix: Prefix::new(prefix),
        })
    }

    pub fn on<D, M, H, Fut>(&mut self, description: D, priority: i32, matcher: M, handler: H)
    where
        D: Into<Cow<'static, str>>,
        M: Into<Matcher>,
        H: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.plugins[0].on(description, priority, matcher, handler);
    }

    pub fn register_plugin(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub async fn start(self) -> Result<()> {
        self.adapter.spawn(self.plugins, self.prefix).await
    }

    pub fn use_builtin_handler(&mut self) {
        self.on(
            "List every command",
            i32::MAX,
            Rule::on_human() & Rule::on_command("help"),
            |ctx| async move {
                ctx.send_embed(help_embed(&ctx.plugins, &ctx.prefix.get())).await?;
                Ok(true)
            },
        );
    }
}

/// 每个插件一个字段，只列出由命令触发的处理器
pub fn help_embed(plugins: &[Plugin], prefix: &str) -> Embed {
    let mut embed = Embed::new("📜 Command list").color(color::GREEN);
    for plugin in plugins {
        let lines = plugin
            .commands()
            .map(|(command, description)| format!("`{prefix}{command}` - {description}"))
            .collect::<Vec<_>>();
        if lines.is_empty() {
            continue;
        }
        embed = embed.field(format!("{} - {}", plugin.name, plugin.description), lines.join("\n"), false);
    }
    embed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lists_commands_with_prefix() {
        let mut plugin = Plugin::new("Bans", "Ban list management");
        plugin.on("[Leaders] Ban a member", 0, Rule::on_command("ban"), |_| async { Ok(true) });
        plugin.on("Reaction listener", 0, Rule::on_reaction_add(), |_| async { Ok(false) });
        let silent = Plugin::new("Listener", "No commands");
        let embed = help_embed(&[plugin, silent], "?");
        assert_eq!(embed.fields.len(), 1);
        assert_eq!(embed.fields[0].name, "Bans - Ban list management");
        assert_eq!(embed.fields[0].value, "`?ban` - [Leaders] Ban a member");
    }
}
