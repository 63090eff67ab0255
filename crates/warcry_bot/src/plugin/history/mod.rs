use std::sync::Arc;

use warcry::{
    plugin::Plugin,
    schema::{Embed, color},
};

use crate::{model::history::HistoryEntry, permission::Tier, plugin::command, state::State};

fn history_page(entry: &HistoryEntry) -> Embed {
    let members = entry
        .members()
        .enumerate()
        .map(|(index, member)| format!("{}. {}", index + 1, member.id.mention()))
        .collect::<Vec<_>>();
    let members = if members.is_empty() {
        "No members joined.".to_owned()
    } else {
        members.join("\n")
    };
    Embed::new(format!("Party WB - {} UTC | {}", entry.formatted_time(), entry.date))
        .color(color::ORANGE)
        .field("Party leader", entry.leader_id.mention(), false)
        .field("Points deducted", entry.penalty.to_string(), false)
        .field("Members", members, false)
}

pub fn history_plugin(state: Arc<State>) -> Plugin {
    let mut plugin = Plugin::new("Party history", "Finished World Boss parties");

    plugin.on(
        "[Leaders] Browse finished parties, newest first",
        i32::default(),
        command("wbhistory"),
        move |ctx| {
            let state = state.clone();
            async move {
                if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                    return Ok(true);
                }
                let history = state.store.history.load().await?;
                if history.entries().is_empty() {
                    ctx.send("❌ No party history available.").await?;
                    return Ok(true);
                }
                let pages = history.entries().iter().map(history_page).collect();
                state.pagers.send(&ctx, pages).await?;
                Ok(true)
            }
        },
    );

    plugin
}

#[cfg(test)]
mod tests {
    use warcry::schema::Id;

    use super::*;
    use crate::model::party::{Enrollee, PartyRole, PartySession};

    #[test]
    fn test_history_page() {
        let mut session = PartySession::new(Id(100), "0730", "09/10/2025");
        for (id, role) in [(2, PartyRole::Scout), (1, PartyRole::Maintank)] {
            session
                .pick(
                    Enrollee {
                        id: Id(id),
                        name: String::new(),
                    },
                    role,
                )
                .unwrap();
        }
        session.raise_penalty(Id(100)).unwrap();
        let page = history_page(&session.finalize(Id(100)).unwrap());
        assert_eq!(page.title.as_deref(), Some("Party WB - 07:30 UTC | 09/10/2025"));
        assert_eq!(page.fields[0].value, "<@100>");
        assert_eq!(page.fields[1].value, "1");
        // 按职位顺序编号
        assert_eq!(page.fields[2].value, "1. <@1>\n2. <@2>");
    }

    #[test]
    fn test_history_page_without_members() {
        let mut session = PartySession::new(Id(100), "0730", "09/10/2025");
        let page = history_page(&session.finalize(Id(100)).unwrap());
        assert_eq!(page.fields[2].value, "No members joined.");
    }
}
