use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};

use crate::model::{bans::BanList, fines::FineLedger, history::PartyHistory, points::PointLedger};

/// 单个 JSON 文件，每次读写都是整个文件
#[derive(Debug, Clone)]
pub struct Ledger<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Ledger<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// 文件不存在时返回空账本
    pub async fn load(&self) -> Result<T> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        };
        serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// 没有加锁，并发写入时以最后一次为准
    pub async fn save(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    pub points: Ledger<PointLedger>,
    pub fines: Ledger<FineLedger>,
    pub bans: Ledger<BanList>,
    pub history: Ledger<PartyHistory>,
}

impl Store {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self {
            points: Ledger::new(dir.join("scores.json")),
            fines: Ledger::new(dir.join("fines.json")),
            bans: Ledger::new(dir.join("bans.json")),
            history: Ledger::new(dir.join("party_history.json")),
        })
    }
}
