use crate::{permission::Permissions, store::Store, utils::pager::Pagers};

/// 所有插件共享的状态
pub struct State {
    pub store: Store,
    pub permissions: Permissions,
    pub pagers: Pagers,
}

impl State {
    pub fn new(store: Store, permissions: Permissions) -> Self {
        Self {
            store,
            permissions,
            pagers: Pagers::default(),
        }
    }
}
