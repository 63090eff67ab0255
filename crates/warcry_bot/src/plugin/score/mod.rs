use std::{collections::HashMap, sync::Arc};

use warcry::{
    chain::Context,
    plugin::Plugin,
    schema::{Embed, Id, color},
};

use crate::{
    model::points::PointRecord,
    permission::Tier,
    plugin::{PAGE_SIZE, command},
    state::State,
    utils::{
        args::parse_members,
        member::{UNKNOWN_MEMBER, member_names},
    },
};

#[derive(Debug, PartialEq)]
enum ScoreArgs {
    Own,
    Adjust(Vec<Id>, i64),
    NoMembers,
    BadDelta,
}

/// 最后一个参数为增减的积分，其余参数均为成员
fn parse_args(args: &[String]) -> ScoreArgs {
    let Some((delta, members)) = args.split_last() else {
        return ScoreArgs::Own;
    };
    // i64::MIN 的绝对值无法计入 spent
    let Some(delta) = delta.parse::<i64>().ok().filter(|delta| *delta != i64::MIN) else {
        return ScoreArgs::BadDelta;
    };
    match parse_members(members) {
        Some(members) if !members.is_empty() => ScoreArgs::Adjust(members, delta),
        _ => ScoreArgs::NoMembers,
    }
}

fn name_of(names: &HashMap<Id, String>, id: Id) -> &str {
    names.get(&id).map_or(UNKNOWN_MEMBER, String::as_str)
}

fn score_pages(ranking: &[(Id, PointRecord)], names: &HashMap<Id, String>) -> Vec<Embed> {
    ranking
        .chunks(PAGE_SIZE)
        .enumerate()
        .map(|(page, chunk)| {
            let lines = chunk
                .iter()
                .enumerate()
                .map(|(offset, (id, record))| {
                    format!(
                        "**{}. {}** - {} points",
                        page * PAGE_SIZE + offset + 1,
                        name_of(names, *id),
                        record.current
                    )
                })
                .collect::<Vec<_>>();
            Embed::new("🏅 Guild score")
                .color(color::PURPLE)
                .description(lines.join("\n"))
        })
        .collect()
}

fn ranking_embed(ranking: &[(Id, PointRecord)], names: &HashMap<Id, String>) -> Embed {
    let top = &ranking[..ranking.len().min(PAGE_SIZE)];
    let positions = (1..=top.len()).map(|pos| pos.to_string()).collect::<Vec<_>>();
    let members = top.iter().map(|(id, _)| name_of(names, *id)).collect::<Vec<_>>();
    let earned = top.iter().map(|(_, record)| record.earned.to_string()).collect::<Vec<_>>();
    Embed::new("🏆 Earned points ranking (Top 10)")
        .color(color::GOLD)
        .field("Pos", positions.join("\n"), true)
        .field("Member", members.join("\n"), true)
        .field("Earned", earned.join("\n"), true)
}

async fn own_score(state: &State, ctx: &Context) -> anyhow::Result<()> {
    let points = state.store.points.load().await?;
    match points.get(ctx.event.try_user_id()?) {
        Some(record) => {
            let embed = Embed::new(format!("📊 Points of {}", ctx.event.display_name()))
                .color(color::BLUE)
                .field("Current", record.current.to_string(), true)
                .field("Earned", record.earned.to_string(), true)
                .field("Spent", record.spent.to_string(), true);
            ctx.send_embed(embed).await?
        }
        None => ctx.send("❌ You have no points registered.").await?,
    };
    Ok(())
}

pub fn score_plugin(state: Arc<State>) -> Plugin {
    let mut plugin = Plugin::new("Scores", "Guild points ledger");

    let state_clone = state.clone();
    plugin.on(
        "[Members] Check your points, or [Leaders] adjust them: score @user... <delta>",
        i32::default(),
        command("score"),
        move |ctx| {
            let state = state_clone.clone();
            async move {
                if !state.permissions.ensure(&ctx, Tier::Member).await? {
                    return Ok(true);
                }
                let args = parse_args(&ctx.args());
                if args == ScoreArgs::Own {
                    own_score(&state, &ctx).await?;
                    return Ok(true);
                }
                if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                    return Ok(true);
                }
                let (members, delta) = match args {
                    ScoreArgs::Adjust(members, delta) => (members, delta),
                    ScoreArgs::NoMembers => {
                        ctx.send("❌ Mention at least one member.").await?;
                        return Ok(true);
                    }
                    _ => {
                        ctx.send("❌ The last argument must be an integer to add or subtract points.")
                            .await?;
                        return Ok(true);
                    }
                };
                let mut points = state.store.points.load().await?;
                if points.adjust_all(&members, delta).is_none() {
                    ctx.send(format!("❌ Applying {delta} points would overflow a member's record.")).await?;
                    return Ok(true);
                }
                state.store.points.save(&points).await?;
                info!("{} applied {delta} points to {members:?}", ctx.event.try_user_id()?);
                ctx.send(format!("✅ Points updated for {} members.", members.len())).await?;
                Ok(true)
            }
        },
    );

    let state_clone = state.clone();
    plugin.on("Guild score by current points", i32::default(), command("scores"), move |ctx| {
        let state = state_clone.clone();
        async move {
            let points = state.store.points.load().await?;
            if points.is_empty() {
                ctx.send("❌ No points registered yet.").await?;
                return Ok(true);
            }
            let names = member_names(ctx.caller.as_ref(), ctx.event.try_guild_id()?).await?;
            let pages = score_pages(&points.by_current(), &names);
            state.pagers.send(&ctx, pages).await?;
            Ok(true)
        }
    });

    let state_clone = state.clone();
    plugin.on("Top 10 by earned points", i32::default(), command("ranking"), move |ctx| {
        let state = state_clone.clone();
        async move {
            let points = state.store.points.load().await?;
            if points.is_empty() {
                ctx.send("❌ No points data yet.").await?;
                return Ok(true);
            }
            let names = member_names(ctx.caller.as_ref(), ctx.event.try_guild_id()?).await?;
            ctx.send_embed(ranking_embed(&points.by_earned(), &names)).await?;
            Ok(true)
        }
    });

    plugin.on(
        "[Leaders] Reset every member to 0 points",
        i32::default(),
        command("scorereset"),
        move |ctx| {
            let state = state.clone();
            async move {
                if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                    return Ok(true);
                }
                let members = ctx.caller.list_all_guild_members(ctx.event.try_guild_id()?).await?;
                let ids = members
                    .iter()
                    .filter_map(|member| member.user.as_ref())
                    .filter(|user| !user.bot)
                    .map(|user| user.id)
                    .collect::<Vec<_>>();
                let mut points = state.store.points.load().await?;
                points.reset(ids.iter().copied());
                state.store.points.save(&points).await?;
                warn!("{} reset the points of {} members", ctx.event.try_user_id()?, ids.len());
                ctx.send(format!("✅ All points have been reset, {} members start at 0.", ids.len()))
                    .await?;
                Ok(true)
            }
        },
    );

    plugin
}
