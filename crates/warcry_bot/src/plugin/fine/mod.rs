use std::sync::Arc;

use warcry::{
    chain::Context,
    plugin::Plugin,
    schema::{Embed, Id, color},
};

use crate::{
    model::fines::FineRecord,
    permission::Tier,
    plugin::{PAGE_SIZE, command},
    state::State,
    utils::{args::parse_member, member::display_names},
};

/// `fine` 的两种用法
#[derive(Debug, PartialEq)]
enum FineArgs {
    Own,
    Adjust(Id, f64),
    Invalid,
}

fn parse_args(args: &[String]) -> FineArgs {
    match args {
        [] => FineArgs::Own,
        [member, amount] => match (parse_member(member), amount.parse::<f64>()) {
            (Some(id), Ok(amount)) if amount.is_finite() => FineArgs::Adjust(id, amount),
            _ => FineArgs::Invalid,
        },
        _ => FineArgs::Invalid,
    }
}

fn record_embed(title: impl Into<String>, record: &FineRecord) -> Embed {
    Embed::new(title)
        .color(color::RED)
        .field("Debt", format!("{:.2}", record.debt), true)
        .field("Total", format!("{:.2}", record.total), true)
        .field("Paid", format!("{:.2}", record.paid), true)
}

async fn own_fines(state: &State, ctx: &Context) -> anyhow::Result<()> {
    let fines = state.store.fines.load().await?;
    match fines.get(ctx.event.try_user_id()?) {
        Some(record) => {
            ctx.send_embed(record_embed(format!("💸 Fines of {}", ctx.event.display_name()), record))
                .await?
        }
        None => ctx.send("❌ You have no fines registered.").await?,
    };
    Ok(())
}

pub fn fine_plugin(state: Arc<State>) -> Plugin {
    let mut plugin = Plugin::new("Fines", "Guild debt ledger");

    let state_clone = state.clone();
    plugin.on(
        "Check your fines, or [Leaders] adjust one: fine @user <amount>",
        i32::default(),
        command("fine"),
        move |ctx| {
            let state = state_clone.clone();
            async move {
                let (user_id, amount) = match parse_args(&ctx.args()) {
                    FineArgs::Own => {
                        own_fines(&state, &ctx).await?;
                        return Ok(true);
                    }
                    FineArgs::Adjust(user_id, amount) => (user_id, amount),
                    FineArgs::Invalid => {
                        let prefix = ctx.prefix.get();
                        ctx.send(format!(
                            "❌ Usage: `{prefix}fine @user <amount>` to adjust, `{prefix}fine` to check your own."
                        ))
                        .await?;
                        return Ok(true);
                    }
                };
                if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                    return Ok(true);
                }
                let mut fines = state.store.fines.load().await?;
                let Some(record) = fines.adjust(user_id, amount) else {
                    ctx.send(format!("❌ The amount {amount} is too large to register.")).await?;
                    return Ok(true);
                };
                state.store.fines.save(&fines).await?;
                info!("{} adjusted the fine of {user_id} by {amount}", ctx.event.try_user_id()?);
                ctx.send(format!(
                    "✅ Fine updated for {}. Debt: {:.2}",
                    user_id.mention(),
                    record.debt
                ))
                .await?;
                Ok(true)
            }
        },
    );

    plugin.on("[Leaders] List every fine", i32::default(), command("fines"), move |ctx| {
        let state = state.clone();
        async move {
            if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                return Ok(true);
            }
            let fines = state.store.fines.load().await?;
            if fines.is_empty() {
                ctx.send("❌ No fines registered.").await?;
                return Ok(true);
            }
            let records = fines.iter().map(|(id, record)| (id, *record)).collect::<Vec<_>>();
            let ids = records.iter().map(|(id, _)| *id).collect::<Vec<_>>();
            let names = display_names(ctx.caller.as_ref(), ctx.event.try_guild_id()?, &ids).await;
            let pages = records
                .iter()
                .zip(names)
                .collect::<Vec<_>>()
                .chunks(PAGE_SIZE)
                .map(|chunk| {
                    chunk.iter().fold(
                        Embed::new("📄 Fines").color(color::BLUE),
                        |embed, ((_, record), name)| {
                            embed.field(
                                name.as_str(),
                                format!(
                                    "Debt: {:.2} | Total: {:.2} | Paid: {:.2}",
                                    record.debt, record.total, record.paid
                                ),
                                false,
                            )
                        },
                    )
                })
                .collect();
            state.pagers.send(&ctx, pages).await?;
            Ok(true)
        }
    });

    plugin
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(ToOwned::to_owned).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(&args("")), FineArgs::Own);
        assert_eq!(parse_args(&args("<@5> 1.5")), FineArgs::Adjust(Id(5), 1.5));
        assert_eq!(parse_args(&args("<@!5> -3")), FineArgs::Adjust(Id(5), -3.0));
        assert_eq!(parse_args(&args("<@5>")), FineArgs::Invalid);
        assert_eq!(parse_args(&args("<@5> lots")), FineArgs::Invalid);
        assert_eq!(parse_args(&args("<@5> NaN")), FineArgs::Invalid);
        assert_eq!(parse_args(&args("1.5 <@5>")), FineArgs::Invalid);
    }

    #[test]
    fn test_record_embed_uses_two_decimals() {
        let record = FineRecord::default().applied(5.0).and_then(|r| r.applied(-2.0)).unwrap();
        let embed = record_embed("💸 Fines of Ana", &record);
        let values = embed.fields.iter().map(|f| f.value.as_str()).collect::<Vec<_>>();
        assert_eq!(values, vec!["3.00", "5.00", "2.00"]);
    }
}
