use std::sync::{Arc, PoisonError, RwLock};

/// 运行期可修改的命令前缀，所有事件共享同一份
#[derive(Clone, Debug)]
pub struct Prefix(Arc<RwLock<String>>);

impl Prefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(prefix.into())))
    }

    pub fn get(&self) -> String {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, prefix: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = prefix.into();
    }
}

/// 将 `!score @a 10` 拆为 `("score", "@a 10")`，前缀不符或命令为空时返回 `None`
pub fn split_command<'a>(text: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let body = text.trim().strip_prefix(prefix)?;
    let (name, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    (!name.is_empty()).then(|| (name, rest.trim()))
}
