use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warcry::schema::Id;

use crate::model::history::HistoryEntry;

/// 世界 Boss 队伍的固定职位，声明顺序即展示顺序
#[derive(Serialize, Deserialize, Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    #[display("Maintank")]
    Maintank,
    #[display("Offtank")]
    Offtank,
    #[display("Healer")]
    Healer,
    #[display("Bird")]
    Bird,
    #[display("Perma")]
    Perma,
    #[display("Curse")]
    Curse,
    #[display("Fire")]
    Fire,
    #[display("Mount")]
    Mount,
    #[display("Scout")]
    Scout,
}

impl PartyRole {
    pub const ALL: [PartyRole; 9] = [
        Self::Maintank,
        Self::Offtank,
        Self::Healer,
        Self::Bird,
        Self::Perma,
        Self::Curse,
        Self::Fire,
        Self::Mount,
        Self::Scout,
    ];

    pub const EMOJIS: [&'static str; 9] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣"];

    pub fn emoji(self) -> &'static str {
        Self::EMOJIS[self as usize]
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        Self::EMOJIS
            .iter()
            .position(|candidate| *candidate == emoji)
            .map(|index| Self::ALL[index])
    }

    /// 每个职位在服务器里对应一个名为 `b-<slug>` 的文字频道
    pub fn channel_name(self) -> String {
        format!("b-{}", self.to_string().to_lowercase())
    }
}

#[derive(Serialize, Deserialize, Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartyState {
    #[default]
    #[display("⏳ Waiting to start")]
    Pending,
    #[display("⚔️ Party in progress")]
    Active,
    #[display("✅ Party finished")]
    Closed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Enrollee {
    pub id: Id,
    pub name: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PartyError {
    #[error("only the party leader can do this")]
    NotLeader,
    #[error("the party is already closed")]
    Closed,
    #[error("the party has already started")]
    AlreadyStarted,
    #[error("the penalty cannot go below 0")]
    PenaltyFloor,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PartySession {
    pub leader_id: Id,
    /// `HHMM`，UTC
    pub time: String,
    /// `dd/mm/yyyy`，UTC
    pub date: String,
    pub roles: BTreeMap<PartyRole, Vec<Enrollee>>,
    pub state: PartyState,
    pub penalty: u32,
}

impl PartySession {
    pub fn new(leader_id: Id, time: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            leader_id,
            time: time.into(),
            date: date.into(),
            roles: PartyRole::ALL.iter().map(|role| (*role, Vec::new())).collect(),
            state: PartyState::Pending,
            penalty: 0,
        }
    }

    pub fn formatted_time(&self) -> String {
        format_time(&self.time)
    }

    pub fn is_closed(&self) -> bool {
        self.state == PartyState::Closed
    }

    pub fn role_of(&self, id: Id) -> Option<PartyRole> {
        self.roles
            .iter()
            .find(|(_, members)| members.iter().any(|member| member.id == id))
            .map(|(role, _)| *role)
    }

    /// 按职位顺序列出所有报名成员
    pub fn members(&self) -> impl Iterator<Item = &Enrollee> {
        self.roles.values().flatten()
    }

    /// 每个成员同一时间只能占一个职位
    pub fn pick(&mut self, member: Enrollee, role: PartyRole) -> Result<(), PartyError> {
        if self.is_closed() {
            return Err(PartyError::Closed);
        }
        self.remove(member.id);
        self.roles.entry(role).or_default().push(member);
        Ok(())
    }

    /// 返回成员此前是否已报名
    pub fn unpick(&mut self, id: Id) -> Result<bool, PartyError> {
        if self.is_closed() {
            return Err(PartyError::Closed);
        }
        Ok(self.remove(id))
    }

    fn remove(&mut self, id: Id) -> bool {
        let mut removed = false;
        for members in self.roles.values_mut() {
            let len = members.len();
            members.retain(|member| member.id != id);
            removed |= members.len() != len;
        }
        removed
    }

    fn authorize(&self, actor: Id) -> Result<(), PartyError> {
        if self.is_closed() {
            return Err(PartyError::Closed);
        }
        if actor != self.leader_id {
            return Err(PartyError::NotLeader);
        }
        Ok(())
    }

    pub fn start(&mut self, actor: Id) -> Result<(), PartyError> {
        self.authorize(actor)?;
        if self.state == PartyState::Active {
            return Err(PartyError::AlreadyStarted);
        }
        self.state = PartyState::Active;
        Ok(())
    }

    pub fn raise_penalty(&mut self, actor: Id) -> Result<u32, PartyError> {
        self.authorize(actor)?;
        self.penalty += 1;
        Ok(self.penalty)
    }

    pub fn lower_penalty(&mut self, actor: Id) -> Result<u32, PartyError> {
        self.authorize(actor)?;
        if self.penalty == 0 {
            return Err(PartyError::PenaltyFloor);
        }
        self.penalty -= 1;
        Ok(self.penalty)
    }

    /// 关闭队伍并返回用于归档的快照，此后队伍不可再修改
    pub fn finalize(&mut self, actor: Id) -> Result<HistoryEntry, PartyError> {
        self.authorize(actor)?;
        self.state = PartyState::Closed;
        Ok(HistoryEntry::from(&*self))
    }
}

/// `1800` -> `18:00`
pub fn format_time(time: &str) -> String {
    match (time.get(..2), time.get(2..)) {
        (Some(hours), Some(minutes)) => format!("{hours}:{minutes}"),
        _ => time.to_owned(),
    }
}

/// 校验 `HHMM` 格式的 24 小时制时间
pub fn parse_schedule(arg: &str) -> Option<String> {
    if arg.len() != 4 || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u8 = arg[..2].parse().ok()?;
    let minutes: u8 = arg[2..].parse().ok()?;
    (hours < 24 && minutes < 60).then(|| arg.to_owned())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const LEADER: Id = Id(100);

    fn enrollee(id: u64) -> Enrollee {
        Enrollee {
            id: Id(id),
            name: format!("member-{id}"),
        }
    }

    #[test]
    fn test_role_emoji_mapping() {
        assert_eq!(PartyRole::from_emoji("3️⃣"), Some(PartyRole::Healer));
        assert_eq!(PartyRole::from_emoji("🔟"), None);
        assert_eq!(PartyRole::Scout.emoji(), "9️⃣");
        assert_eq!(PartyRole::Maintank.channel_name(), "b-maintank");
        assert_eq!(PartyRole::ALL.len(), PartyRole::EMOJIS.len());
    }

    #[test]
    fn test_member_holds_single_role() {
        let mut session = PartySession::new(LEADER, "1800", "01/02/2025");
        for role in [PartyRole::Healer, PartyRole::Scout, PartyRole::Fire, PartyRole::Healer] {
            session.pick(enrollee(1), role).unwrap();
            assert_eq!(session.members().filter(|m| m.id == Id(1)).count(), 1);
        }
        session.pick(enrollee(2), PartyRole::Healer).unwrap();
        assert_eq!(session.role_of(Id(1)), Some(PartyRole::Healer));
        assert_eq!(
            session.roles[&PartyRole::Healer].iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![Id(1), Id(2)]
        );
        assert_eq!(session.unpick(Id(1)), Ok(true));
        assert_eq!(session.unpick(Id(1)), Ok(false));
        assert_eq!(session.role_of(Id(1)), None);
    }

    #[test]
    fn test_only_leader_drives_session() {
        let mut session = PartySession::new(LEADER, "1800", "01/02/2025");
        assert_matches!(session.start(Id(1)), Err(PartyError::NotLeader));
        assert_matches!(session.raise_penalty(Id(1)), Err(PartyError::NotLeader));
        assert_matches!(session.finalize(Id(1)), Err(PartyError::NotLeader));
        assert_eq!(session.state, PartyState::Pending);
        session.start(LEADER).unwrap();
        assert_eq!(session.state, PartyState::Active);
        assert_matches!(session.start(LEADER), Err(PartyError::AlreadyStarted));
    }

    #[test]
    fn test_penalty_floor() {
        let mut session = PartySession::new(LEADER, "1800", "01/02/2025");
        assert_matches!(session.lower_penalty(LEADER), Err(PartyError::PenaltyFloor));
        assert_eq!(session.raise_penalty(LEADER), Ok(1));
        assert_eq!(session.raise_penalty(LEADER), Ok(2));
        assert_eq!(session.lower_penalty(LEADER), Ok(1));
        assert_eq!(session.penalty, 1);
    }

    #[test]
    fn test_finalize_is_terminal() {
        let mut session = PartySession::new(LEADER, "2130", "01/02/2025");
        session.pick(enrollee(1), PartyRole::Maintank).unwrap();
        session.raise_penalty(LEADER).unwrap();
        let entry = session.finalize(LEADER).unwrap();
        assert_eq!(entry.penalty, 1);
        assert_eq!(entry.members().map(|m| m.id).collect::<Vec<_>>(), vec![Id(1)]);
        assert_matches!(session.pick(enrollee(2), PartyRole::Healer), Err(PartyError::Closed));
        assert_matches!(session.unpick(Id(1)), Err(PartyError::Closed));
        assert_matches!(session.raise_penalty(LEADER), Err(PartyError::Closed));
        assert_matches!(session.finalize(LEADER), Err(PartyError::Closed));
        assert_eq!(session.role_of(Id(1)), Some(PartyRole::Maintank));
        assert_eq!(session.formatted_time(), "21:30");
    }

    #[test]
    fn test_parse_schedule() {
        assert_eq!(parse_schedule("1800"), Some("1800".to_owned()));
        assert_eq!(parse_schedule("0000"), Some("0000".to_owned()));
        assert_eq!(parse_schedule("2400"), None);
        assert_eq!(parse_schedule("1860"), None);
        assert_eq!(parse_schedule("180"), None);
        assert_eq!(parse_schedule("18:0"), None);
        assert_eq!(parse_schedule("+800"), None);
    }
}
