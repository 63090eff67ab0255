use std::{cmp::Reverse, collections::BTreeMap};

use anyhow::Result;
use warcry::schema::{ActionRow, Button, ButtonStyle, Channel, Embed, Id, color};

use crate::{
    model::{
        bans::BanList,
        fines::FineLedger,
        party::{PartyRole, PartySession, PartyState},
        points::PointLedger,
    },
    store::Store,
};

pub const START: &str = "party:start";
pub const PENALTY_UP: &str = "party:penalty_up";
pub const PENALTY_DOWN: &str = "party:penalty_down";
pub const FINISH: &str = "party:finish";

const EMPTY_ROLE: &str = "—";
const NO_CHANNEL: &str = "[N/A]";

/// 每个职位对应频道的链接
pub type RoleLinks = BTreeMap<PartyRole, String>;

pub fn role_links(guild_id: Id, channels: &[Channel]) -> RoleLinks {
    PartyRole::ALL
        .iter()
        .filter_map(|role| {
            let name = role.channel_name();
            channels
                .iter()
                .find(|channel| channel.kind == Channel::GUILD_TEXT && channel.name.as_deref() == Some(name.as_str()))
                .map(|channel| (*role, format!("https://discord.com/channels/{guild_id}/{}", channel.id)))
        })
        .collect()
}

/// 渲染队伍面板时需要的三本账
#[derive(Debug, Default)]
pub struct Standings {
    pub points: PointLedger,
    pub fines: FineLedger,
    pub bans: BanList,
}

impl Standings {
    pub async fn load(store: &Store) -> Result<Self> {
        Ok(Self {
            points: store.points.load().await?,
            fines: store.fines.load().await?,
            bans: store.bans.load().await?,
        })
    }

    /// 有欠款或被封禁
    fn flagged(&self, id: Id) -> bool {
        self.fines.has_debt(id) || self.bans.contains(id)
    }
}

pub fn render_board(session: &PartySession, links: &RoleLinks, standings: &Standings) -> Embed {
    let embed = Embed::new(format!(
        "Party WB - {} UTC | {}",
        session.formatted_time(),
        session.date
    ))
    .color(color::DARK_RED)
    .description(format!(
        "Leader: {}\nPenalty: {}\nState: {}",
        session.leader_id.mention(),
        session.penalty,
        session.state
    ));
    PartyRole::ALL.iter().fold(embed, |embed, role| {
        let mut members = session.roles.get(role).map(Vec::as_slice).unwrap_or_default().to_vec();
        members.sort_by_key(|member| Reverse(standings.points.current(member.id)));
        let lines = members
            .iter()
            .map(|member| {
                let line = format!("{} ({})", member.name, standings.points.current(member.id));
                if standings.flagged(member.id) {
                    format!("```diff\n- {line}```")
                } else {
                    line
                }
            })
            .collect::<Vec<_>>();
        let value = if lines.is_empty() {
            EMPTY_ROLE.to_owned()
        } else {
            lines.join("\n")
        };
        let link = links.get(role).map_or(NO_CHANNEL, String::as_str);
        embed.field(format!("{} {role}\n{link}", role.emoji()), value, true)
    })
}

/// 已结束的队伍不再显示任何按钮
pub fn controls(session: &PartySession) -> Vec<ActionRow> {
    if session.is_closed() {
        return Vec::new();
    }
    vec![ActionRow::new(vec![
        Button::new(ButtonStyle::Success, "✅ Start party", START).disabled(session.state != PartyState::Pending),
        Button::new(ButtonStyle::Secondary, "➕", PENALTY_UP),
        Button::new(ButtonStyle::Secondary, "➖", PENALTY_DOWN),
        Button::new(ButtonStyle::Danger, "❌ Finish party", FINISH),
    ])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::party::Enrollee;

    const LEADER: Id = Id(100);

    fn enroll(session: &mut PartySession, id: u64, name: &str, role: PartyRole) {
        session
            .pick(
                Enrollee {
                    id: Id(id),
                    name: name.to_owned(),
                },
                role,
            )
            .unwrap();
    }

    #[test]
    fn test_role_links() {
        let channels: Vec<Channel> = serde_json::from_value(serde_json::json!([
            {"id": "11", "type": 0, "name": "b-healer"},
            {"id": "12", "type": 2, "name": "b-scout"},
            {"id": "13", "type": 0, "name": "general"}
        ]))
        .unwrap();
        let links = role_links(Id(1), &channels);
        assert_eq!(links.len(), 1);
        assert_eq!(links[&PartyRole::Healer], "https://discord.com/channels/1/11");
    }

    #[test]
    fn test_render_board() {
        let mut session = PartySession::new(LEADER, "1800", "02/03/2025");
        enroll(&mut session, 1, "Ana", PartyRole::Healer);
        enroll(&mut session, 2, "Bruno", PartyRole::Healer);
        enroll(&mut session, 3, "Caro", PartyRole::Scout);
        let mut standings = Standings::default();
        standings.points.adjust(Id(2), 8);
        standings.points.adjust(Id(1), 3);
        standings.fines.adjust(Id(3), 1.5);
        let links = RoleLinks::from([(PartyRole::Healer, "https://discord.com/channels/1/11".to_owned())]);

        let embed = render_board(&session, &links, &standings);
        assert_eq!(embed.title.as_deref(), Some("Party WB - 18:00 UTC | 02/03/2025"));
        assert_eq!(
            embed.description.as_deref(),
            Some("Leader: <@100>\nPenalty: 0\nState: ⏳ Waiting to start")
        );
        assert_eq!(embed.fields.len(), 9);
        assert_eq!(embed.fields[0].name, "1️⃣ Maintank\n[N/A]");
        assert_eq!(embed.fields[0].value, EMPTY_ROLE);
        assert_eq!(embed.fields[2].name, "3️⃣ Healer\nhttps://discord.com/channels/1/11");
        assert_eq!(embed.fields[2].value, "Bruno (8)\nAna (3)");
        assert_eq!(embed.fields[8].value, "```diff\n- Caro (0)```");
        assert!(embed.fields.iter().all(|field| field.inline));
    }

    #[test]
    fn test_controls_follow_state() {
        let mut session = PartySession::new(LEADER, "1800", "02/03/2025");
        assert!(!controls(&session)[0].components[0].disabled);
        session.start(LEADER).unwrap();
        let rows = controls(&session);
        assert!(rows[0].components[0].disabled);
        assert_eq!(rows[0].components.len(), 4);
        session.finalize(LEADER).unwrap();
        assert!(controls(&session).is_empty());
    }
}
