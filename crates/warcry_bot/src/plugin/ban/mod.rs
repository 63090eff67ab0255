use std::sync::Arc;

use warcry::{
    plugin::Plugin,
    schema::{Embed, color},
};

use crate::{
    permission::Tier,
    plugin::{PAGE_SIZE, command},
    state::State,
    utils::{
        args::parse_member,
        member::{display_name, display_names},
    },
};

pub fn ban_plugin(state: Arc<State>) -> Plugin {
    let mut plugin = Plugin::new("Bans", "Guild ban list");

    let state_clone = state.clone();
    plugin.on("[Leaders] Ban a member: ban @user", i32::default(), command("ban"), move |ctx| {
        let state = state_clone.clone();
        async move {
            if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                return Ok(true);
            }
            let Some(user_id) = ctx.args().first().and_then(|arg| parse_member(arg)) else {
                ctx.send(format!("❌ Usage: `{}ban @user`", ctx.prefix.get())).await?;
                return Ok(true);
            };
            let name = display_name(ctx.caller.as_ref(), ctx.event.try_guild_id()?, user_id).await;
            let mut bans = state.store.bans.load().await?;
            if !bans.ban(user_id) {
                ctx.send(format!("⚠️ {name} is already banned.")).await?;
                return Ok(true);
            }
            state.store.bans.save(&bans).await?;
            info!("{} banned {user_id}", ctx.event.try_user_id()?);
            ctx.send(format!("🚫 {name} has been banned.")).await?;
            Ok(true)
        }
    });

    let state_clone = state.clone();
    plugin.on("[Leaders] Lift a ban: unban @user", i32::default(), command("unban"), move |ctx| {
        let state = state_clone.clone();
        async move {
            if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                return Ok(true);
            }
            let Some(user_id) = ctx.args().first().and_then(|arg| parse_member(arg)) else {
                ctx.send(format!("❌ Usage: `{}unban @user`", ctx.prefix.get())).await?;
                return Ok(true);
            };
            let name = display_name(ctx.caller.as_ref(), ctx.event.try_guild_id()?, user_id).await;
            let mut bans = state.store.bans.load().await?;
            if !bans.unban(user_id) {
                ctx.send(format!("⚠️ {name} is not banned.")).await?;
                return Ok(true);
            }
            state.store.bans.save(&bans).await?;
            info!("{} unbanned {user_id}", ctx.event.try_user_id()?);
            ctx.send(format!("✅ {name} has been unbanned.")).await?;
            Ok(true)
        }
    });

    plugin.on("List banned members", i32::default(), command("bans"), move |ctx| {
        let state = state.clone();
        async move {
            let bans = state.store.bans.load().await?;
            if bans.is_empty() {
                ctx.send("✅ No banned users.").await?;
                return Ok(true);
            }
            let guild_id = ctx.event.try_guild_id()?;
            let ids = bans.iter().collect::<Vec<_>>();
            let names = display_names(ctx.caller.as_ref(), guild_id, &ids).await;
            let pages = ids
                .iter()
                .zip(names)
                .collect::<Vec<_>>()
                .chunks(PAGE_SIZE)
                .map(|chunk| {
                    chunk.iter().fold(
                        Embed::new("🚫 Banned users").color(color::DARK_RED),
                        |embed, (id, name)| embed.field(name.as_str(), format!("ID: {id}"), false),
                    )
                })
                .collect();
            state.pagers.send(&ctx, pages).await?;
            Ok(true)
        }
    });

    plugin
}
