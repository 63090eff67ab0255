use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use warcry::schema::Id;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy, Default)]
pub struct FineRecord {
    /// 尚未缴清的欠款，不会小于 0
    pub debt: f64,
    /// 累计罚款
    pub total: f64,
    /// 累计缴纳
    pub paid: f64,
}

impl FineRecord {
    /// 非负数为罚款，负数为缴款；超出欠款的部分不计入缴纳
    ///
    /// JSON 无法表示非有限值，任何一项不再有限时返回 `None`
    pub fn applied(&self, amount: f64) -> Option<Self> {
        let mut record = *self;
        if amount >= 0.0 {
            record.debt += amount;
            record.total += amount;
        } else {
            record.debt += amount;
            record.paid += amount.abs();
            if record.debt < 0.0 {
                record.paid += record.debt;
                record.debt = 0.0;
            }
        }
        [record.debt, record.total, record.paid]
            .iter()
            .all(|value| value.is_finite())
            .then_some(record)
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(transparent)]
pub struct FineLedger(BTreeMap<Id, FineRecord>);

impl FineLedger {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: Id) -> Option<&FineRecord> {
        self.0.get(&id)
    }

    pub fn has_debt(&self, id: Id) -> bool {
        self.0.get(&id).is_some_and(|record| record.debt > 0.0)
    }

    /// 结果不再有限时不做修改并返回 `None`
    pub fn adjust(&mut self, id: Id, amount: f64) -> Option<FineRecord> {
        let record = self.0.get(&id).copied().unwrap_or_default().applied(amount)?;
        self.0.insert(id, record);
        Some(record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &FineRecord)> {
        self.0.iter().map(|(id, record)| (*id, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_clamps_debt() {
        let mut ledger = FineLedger::default();
        ledger.adjust(Id(1), 5.0);
        let record = ledger.adjust(Id(1), -2.0).unwrap();
        assert_eq!(
            record,
            FineRecord {
                debt: 3.0,
                total: 5.0,
                paid: 2.0
            }
        );
        let record = ledger.adjust(Id(1), -10.0).unwrap();
        assert_eq!(
            record,
            FineRecord {
                debt: 0.0,
                total: 5.0,
                paid: 5.0
            }
        );
        assert!(!ledger.has_debt(Id(1)));
    }

    #[test]
    fn test_debt_never_negative() {
        let mut ledger = FineLedger::default();
        for amount in [1.5, -0.5, -3.0, 2.25, -1.0, 0.0, -7.5, 4.0] {
            let record = ledger.adjust(Id(9), amount).unwrap();
            assert!(record.debt >= 0.0);
            assert!(record.paid <= record.total);
        }
        assert_eq!(ledger.get(Id(9)).map(|r| r.debt), Some(4.0));
        assert!(ledger.has_debt(Id(9)));
    }

    #[test]
    fn test_payment_without_debt() {
        let mut ledger = FineLedger::default();
        let record = ledger.adjust(Id(2), -3.0);
        assert_eq!(record, Some(FineRecord::default()));
    }

    #[test]
    fn test_overflowing_fine_is_rejected() {
        let mut ledger = FineLedger::default();
        let first = ledger.adjust(Id(1), 1e308).unwrap();
        assert_eq!(ledger.adjust(Id(1), 1e308), None);
        assert_eq!(ledger.get(Id(1)), Some(&first));
        assert_eq!(ledger.adjust(Id(2), f64::INFINITY), None);
        assert!(ledger.get(Id(2)).is_none());
    }
}
