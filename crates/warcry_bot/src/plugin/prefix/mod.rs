use std::sync::Arc;

use warcry::plugin::Plugin;

use crate::{permission::Tier, plugin::command, state::State};

pub fn prefix_plugin(state: Arc<State>) -> Plugin {
    let mut plugin = Plugin::new("Prefix", "Command prefix");

    plugin.on(
        "[Leaders] Change the command prefix: prefix <new>",
        i32::default(),
        command("prefix"),
        move |ctx| {
            let state = state.clone();
            async move {
                if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                    return Ok(true);
                }
                let Some(prefix) = ctx.args().into_iter().next() else {
                    let current = ctx.prefix.get();
                    ctx.send(format!("❌ Specify the new prefix, for example `{current}prefix ?`"))
                        .await?;
                    return Ok(true);
                };
                ctx.prefix.set(prefix.clone());
                info!("Command prefix changed to {prefix}");
                ctx.send(format!("✅ Prefix updated to `{prefix}`")).await?;
                Ok(true)
            }
        },
    );

    plugin
}
