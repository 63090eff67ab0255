use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use warcry::schema::Id;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct PointRecord {
    /// 当前可用积分，允许为负
    pub current: i64,
    /// 累计获得
    pub earned: i64,
    /// 累计消耗
    pub spent: i64,
}

impl PointRecord {
    /// 任何一项溢出时返回 `None`
    pub fn applied(&self, delta: i64) -> Option<Self> {
        let current = self.current.checked_add(delta)?;
        let (earned, spent) = if delta >= 0 {
            (self.earned.checked_add(delta)?, self.spent)
        } else {
            (self.earned, self.spent.checked_add(delta.checked_neg()?)?)
        };
        Some(Self { current, earned, spent })
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(transparent)]
pub struct PointLedger(BTreeMap<Id, PointRecord>);

impl PointLedger {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: Id) -> Option<&PointRecord> {
        self.0.get(&id)
    }

    /// 未登记的成员按 0 计
    pub fn current(&self, id: Id) -> i64 {
        self.0.get(&id).map_or(0, |record| record.current)
    }

    /// 溢出时不做修改并返回 `None`
    pub fn adjust(&mut self, id: Id, delta: i64) -> Option<PointRecord> {
        let record = self.0.get(&id).copied().unwrap_or_default().applied(delta)?;
        self.0.insert(id, record);
        Some(record)
    }

    /// 所有成员都能吸收 delta 时才写入，否则整体不做修改
    pub fn adjust_all(&mut self, ids: &[Id], delta: i64) -> Option<Vec<PointRecord>> {
        let records = ids
            .iter()
            .map(|id| self.0.get(id).copied().unwrap_or_default().applied(delta))
            .collect::<Option<Vec<_>>>()?;
        self.0.extend(ids.iter().copied().zip(records.iter().copied()));
        Some(records)
    }

    /// 只扣除已登记成员的积分，返回实际被扣除的成员；会溢出的记录保持不变
    pub fn deduct(&mut self, ids: impl IntoIterator<Item = Id>, penalty: u32) -> Vec<Id> {
        let delta = -i64::from(penalty);
        ids.into_iter()
            .filter(|id| {
                let Some(record) = self.0.get_mut(id) else {
                    return false;
                };
                match record.applied(delta) {
                    Some(applied) => {
                        *record = applied;
                        true
                    }
                    None => {
                        warn!("Points of {id} cannot absorb a penalty of {penalty}");
                        false
                    }
                }
            })
            .collect()
    }

    pub fn reset(&mut self, ids: impl IntoIterator<Item = Id>) {
        self.0 = ids.into_iter().map(|id| (id, PointRecord::default())).collect();
    }

    pub fn by_current(&self) -> Vec<(Id, PointRecord)> {
        self.sorted_by(|record| record.current)
    }

    pub fn by_earned(&self) -> Vec<(Id, PointRecord)> {
        self.sorted_by(|record| record.earned)
    }

    fn sorted_by(&self, key: impl Fn(&PointRecord) -> i64) -> Vec<(Id, PointRecord)> {
        let mut records = self.0.iter().map(|(id, record)| (*id, *record)).collect::<Vec<_>>();
        records.sort_by(|a, b| key(&b.1).cmp(&key(&a.1)));
        records
    }
}
