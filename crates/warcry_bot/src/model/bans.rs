use serde::{Deserialize, Serialize};
use warcry::schema::Id;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(transparent)]
pub struct BanList(Vec<Id>);

impl BanList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.0.contains(&id)
    }

    /// 已经在列表中时返回 false
    pub fn ban(&mut self, id: Id) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// 不在列表中时返回 false
    pub fn unban(&mut self, id: Id) -> bool {
        let len = self.0.len();
        self.0.retain(|banned| *banned != id);
        self.0.len() != len
    }

    pub fn iter(&self) -> impl Iterator<Item = Id> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ban_guards() {
        let mut bans = BanList::default();
        assert!(bans.ban(Id(1)));
        assert!(!bans.ban(Id(1)));
        assert_eq!(bans.iter().collect::<Vec<_>>(), vec![Id(1)]);
        assert!(!bans.unban(Id(2)));
        assert!(bans.unban(Id(1)));
        assert!(!bans.unban(Id(1)));
        assert!(bans.is_empty());
    }
}
