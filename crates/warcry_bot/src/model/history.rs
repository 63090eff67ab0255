use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use warcry::schema::Id;

use crate::model::party::{Enrollee, PartyRole, PartySession, format_time};

/// 已结束队伍的快照
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub leader_id: Id,
    pub time: String,
    pub date: String,
    pub roles: BTreeMap<PartyRole, Vec<Enrollee>>,
    /// 结束时每位成员被扣除的积分
    pub penalty: u32,
}

impl HistoryEntry {
    pub fn formatted_time(&self) -> String {
        format_time(&self.time)
    }

    pub fn members(&self) -> impl Iterator<Item = &Enrollee> {
        self.roles.values().flatten()
    }
}

impl From<&PartySession> for HistoryEntry {
    fn from(session: &PartySession) -> Self {
        Self {
            leader_id: session.leader_id,
            time: session.time.clone(),
            date: session.date.clone(),
            roles: session.roles.clone(),
            penalty: session.penalty,
        }
    }
}

/// 最新的记录在最前
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(transparent)]
pub struct PartyHistory(Vec<HistoryEntry>);

impl PartyHistory {
    pub fn record(&mut self, entry: HistoryEntry) {
        self.0.insert(0, entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut history = PartyHistory::default();
        for time in ["1800", "1900"] {
            history.record(HistoryEntry::from(&PartySession::new(Id(1), time, "01/01/2025")));
        }
        assert_eq!(
            history.entries().iter().map(|e| e.time.as_str()).collect::<Vec<_>>(),
            vec!["1900", "1800"]
        );
    }

    #[test]
    fn test_entry_json_layout() {
        let entry = HistoryEntry::from(&PartySession::new(Id(7), "0930", "05/06/2025"));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["leader_id"], "7");
        assert_eq!(value["roles"]["maintank"], serde_json::json!([]));
        assert_eq!(value["roles"].as_object().unwrap().len(), 9);
        let back: HistoryEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back.formatted_time(), "09:30");
    }
}
