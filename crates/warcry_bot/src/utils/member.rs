use std::collections::HashMap;

use anyhow::Result;
use futures::future::join_all;
use warcry::{adapter::Caller, schema::Id};

pub const UNKNOWN_MEMBER: &str = "Unknown user";

/// 成员在服务器中的显示名，查询失败时返回占位名称
pub async fn display_name(caller: &dyn Caller, guild_id: Id, user_id: Id) -> String {
    match caller.get_guild_member(guild_id, user_id).await {
        Ok(member) => member.display_name().unwrap_or(UNKNOWN_MEMBER).to_owned(),
        Err(e) => {
            debug!("Failed to fetch member {user_id}: {e:?}");
            UNKNOWN_MEMBER.to_owned()
        }
    }
}

pub async fn display_names(caller: &dyn Caller, guild_id: Id, user_ids: &[Id]) -> Vec<String> {
    join_all(user_ids.iter().map(|id| display_name(caller, guild_id, *id))).await
}

/// 一次取回服务器全部成员的显示名，用于较长的列表
pub async fn member_names(caller: &dyn Caller, guild_id: Id) -> Result<HashMap<Id, String>> {
    Ok(caller
        .list_all_guild_members(guild_id)
        .await?
        .into_iter()
        .filter_map(|member| {
            let user = member.user.as_ref()?;
            Some((user.id, member.display_name().unwrap_or(UNKNOWN_MEMBER).to_owned()))
        })
        .collect())
}
