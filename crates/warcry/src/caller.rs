use anyhow::Result;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{adapter::Caller, error::ApiError, schema::*};

macro_rules! route {
    ($($segment:expr),* $(,)?) => {
        vec![$($segment.to_string()),*]
    };
}

fn decode<T: DeserializeOwned>(request: &ApiRequest, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ApiError::ResponseType(request.path(), e).into())
}

async fn call_and_decode<C, T>(connector: &C, request: ApiRequest) -> Result<T>
where
    C: Caller + ?Sized,
    T: DeserializeOwned,
{
    let value = connector.call(request.clone()).await?;
    decode(&request, value)
}

pub async fn create_message<C: Caller + ?Sized>(
    connector: &C,
    channel_id: Id,
    param: CreateMessageParams,
) -> Result<Message> {
    let request = ApiRequest::new(Method::POST, route!["channels", channel_id, "messages"]).json(&param)?;
    call_and_decode(connector, request).await
}

pub async fn edit_message<C: Caller + ?Sized>(
    connector: &C,
    channel_id: Id,
    message_id: Id,
    param: EditMessageParams,
) -> Result<Message> {
    let request =
        ApiRequest::new(Method::PATCH, route!["channels", channel_id, "messages", message_id]).json(&param)?;
    call_and_decode(connector, request).await
}

/// `emoji` 为 Unicode 表情本身或 `name:id`，由适配器负责 URL 编码
pub async fn create_reaction<C: Caller + ?Sized>(connector: &C, channel_id: Id, message_id: Id, emoji: &str) -> Result<()> {
    connector
        .call(ApiRequest::new(
            Method::PUT,
            route!["channels", channel_id, "messages", message_id, "reactions", emoji, "@me"],
        ))
        .await?;
    Ok(())
}

pub async fn delete_all_reactions<C: Caller + ?Sized>(connector: &C, channel_id: Id, message_id: Id) -> Result<()> {
    connector
        .call(ApiRequest::new(
            Method::DELETE,
            route!["channels", channel_id, "messages", message_id, "reactions"],
        ))
        .await?;
    Ok(())
}

pub async fn start_thread_from_message<C: Caller + ?Sized>(
    connector: &C,
    channel_id: Id,
    message_id: Id,
    param: StartThreadParams,
) -> Result<Channel> {
    let request = ApiRequest::new(
        Method::POST,
        route!["channels", channel_id, "messages", message_id, "threads"],
    )
    .json(&param)?;
    call_and_decode(connector, request).await
}

pub async fn create_interaction_response<C: Caller + ?Sized>(
    connector: &C,
    interaction: &Interaction,
    param: InteractionResponse,
) -> Result<()> {
    let request = ApiRequest::new(
        Method::POST,
        route!["interactions", interaction.id, interaction.token, "callback"],
    )
    .json(&param)?;
    connector.call(request).await?;
    Ok(())
}

pub async fn get_guild_member<C: Caller + ?Sized>(connector: &C, guild_id: Id, user_id: Id) -> Result<GuildMember> {
    call_and_decode(
        connector,
        ApiRequest::new(Method::GET, route!["guilds", guild_id, "members", user_id]),
    )
    .await
}

pub async fn list_guild_members<C: Caller + ?Sized>(
    connector: &C,
    guild_id: Id,
    param: ListGuildMembersParams,
) -> Result<Vec<GuildMember>> {
    let mut request = ApiRequest::new(Method::GET, route!["guilds", guild_id, "members"]).query("limit", param.limit);
    if let Some(after) = param.after {
        request = request.query("after", after);
    }
    call_and_decode(connector, request).await
}

/// 按 id 翻页取回所有成员，单页上限为 1000
pub async fn list_all_guild_members<C: Caller + ?Sized>(connector: &C, guild_id: Id) -> Result<Vec<GuildMember>> {
    const PAGE: u16 = 1000;
    let mut members = Vec::new();
    let mut after = None;
    loop {
        let page = list_guild_members(connector, guild_id, ListGuildMembersParams { limit: PAGE, after }).await?;
        let len = page.len();
        after = page.iter().filter_map(|member| member.user.as_ref()).map(|user| user.id).max();
        members.extend(page);
        if len < PAGE as usize || after.is_none() {
            break;
        }
    }
    Ok(members)
}

pub async fn get_guild_roles<C: Caller + ?Sized>(connector: &C, guild_id: Id) -> Result<Vec<Role>> {
    call_and_decode(connector, ApiRequest::new(Method::GET, route!["guilds", guild_id, "roles"])).await
}

pub async fn get_guild_channels<C: Caller + ?Sized>(connector: &C, guild_id: Id) -> Result<Vec<Channel>> {
    call_and_decode(connector, ApiRequest::new(Method::GET, route!["guilds", guild_id, "channels"])).await
}
