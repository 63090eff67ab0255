use std::borrow::Cow;

use enum_as_inner::EnumAsInner;
use serde::Deserialize;
use serde_json::Value;

use crate::{error::EventError, schema::Id};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GuildMember {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Id>,
}

impl GuildMember {
    /// 服务器昵称优先，其次是全局名称与用户名
    pub fn display_name(&self) -> Option<&str> {
        self.nick
            .as_deref()
            .or_else(|| self.user.as_ref().map(User::display_name))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Id,
    pub channel_id: Id,
    #[serde(default)]
    pub guild_id: Option<Id>,
    pub author: User,
    #[serde(default)]
    pub member: Option<GuildMember>,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ReactionEmoji {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ReactionEmoji {
    /// Unicode 表情直接使用名称，自定义表情使用 `name:id`
    pub fn as_key(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), Some(id)) => format!("{name}:{id}"),
            (Some(name), None) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Reaction {
    pub user_id: Id,
    pub channel_id: Id,
    pub message_id: Id,
    #[serde(default)]
    pub guild_id: Option<Id>,
    /// 只有添加回应且位于服务器内时才会携带
    #[serde(default)]
    pub member: Option<GuildMember>,
    pub emoji: ReactionEmoji,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ComponentData {
    pub custom_id: String,
    #[serde(default)]
    pub component_type: u8,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: Id,
    pub application_id: Id,
    #[serde(rename = "type")]
    pub kind: u8,
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<Id>,
    #[serde(default)]
    pub channel_id: Option<Id>,
    #[serde(default)]
    pub member: Option<GuildMember>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<ComponentData>,
}

impl Interaction {
    /// 服务器内的交互只携带 member，私聊中只携带 user
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .or(self.user.as_ref())
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.custom_id.as_str())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Ready {
    pub user: User,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Event {
    Ready(Ready),
    MessageCreate(Message),
    ReactionAdd(Reaction),
    ReactionRemove(Reaction),
    InteractionCreate(Interaction),
}

impl Event {
    /// 将 dispatch（op 0）的负载解析为事件，未关注的类型返回 `None`
    pub fn from_dispatch(kind: &str, data: Value) -> serde_json::Result<Option<Self>> {
        Ok(Some(match kind {
            "READY" => Self::Ready(serde_json::from_value(data)?),
            "MESSAGE_CREATE" => Self::MessageCreate(serde_json::from_value(data)?),
            "MESSAGE_REACTION_ADD" => Self::ReactionAdd(serde_json::from_value(data)?),
            "MESSAGE_REACTION_REMOVE" => Self::ReactionRemove(serde_json::from_value(data)?),
            "INTERACTION_CREATE" => Self::InteractionCreate(serde_json::from_value(data)?),
            _ => return Ok(None),
        }))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "READY",
            Self::MessageCreate(_) => "MESSAGE_CREATE",
            Self::ReactionAdd(_) => "MESSAGE_REACTION_ADD",
            Self::ReactionRemove(_) => "MESSAGE_REACTION_REMOVE",
            Self::InteractionCreate(_) => "INTERACTION_CREATE",
        }
    }

    pub fn try_user_id(&self) -> Result<Id, EventError> {
        match self {
            Self::MessageCreate(message) => Ok(message.author.id),
            Self::ReactionAdd(reaction) | Self::ReactionRemove(reaction) => Ok(reaction.user_id),
            Self::InteractionCreate(interaction) => interaction
                .invoker()
                .map(|user| user.id)
                .ok_or(EventError::MissingField(self.name(), "user")),
            Self::Ready(ready) => Ok(ready.user.id),
        }
    }

    pub fn try_guild_id(&self) -> Result<Id, EventError> {
        match self {
            Self::MessageCreate(Message { guild_id, .. })
            | Self::ReactionAdd(Reaction { guild_id, .. })
            | Self::ReactionRemove(Reaction { guild_id, .. })
            | Self::InteractionCreate(Interaction { guild_id, .. }) => {
                guild_id.ok_or(EventError::MissingField(self.name(), "guild_id"))
            }
            Self::Ready(_) => Err(EventError::MissingField(self.name(), "guild_id")),
        }
    }

    pub fn try_channel_id(&self) -> Result<Id, EventError> {
        match self {
            Self::MessageCreate(Message { channel_id, .. })
            | Self::ReactionAdd(Reaction { channel_id, .. })
            | Self::ReactionRemove(Reaction { channel_id, .. }) => Ok(*channel_id),
            Self::InteractionCreate(interaction) => interaction
                .channel_id
                .ok_or(EventError::MissingField(self.name(), "channel_id")),
            Self::Ready(_) => Err(EventError::MissingField(self.name(), "channel_id")),
        }
    }

    /// 消息事件为消息本身，回应事件为被回应的消息，组件交互为组件所在的消息
    pub fn try_message_id(&self) -> Result<Id, EventError> {
        match self {
            Self::MessageCreate(message) => Ok(message.id),
            Self::ReactionAdd(reaction) | Self::ReactionRemove(reaction) => Ok(reaction.message_id),
            Self::InteractionCreate(interaction) => interaction
                .message
                .as_ref()
                .map(|message| message.id)
                .ok_or(EventError::MissingField(self.name(), "message")),
            Self::Ready(_) => Err(EventError::MissingField(self.name(), "message_id")),
        }
    }

    pub fn member(&self) -> Option<&GuildMember> {
        match self {
            Self::MessageCreate(Message { member, .. })
            | Self::ReactionAdd(Reaction { member, .. })
            | Self::ReactionRemove(Reaction { member, .. })
            | Self::InteractionCreate(Interaction { member, .. }) => member.as_ref(),
            Self::Ready(_) => None,
        }
    }

    /// 事件是否由机器人账号触发；取不到用户信息时视为真人
    pub fn is_from_bot(&self) -> bool {
        match self {
            Self::MessageCreate(message) => message.author.bot,
            Self::InteractionCreate(interaction) => interaction.invoker().is_some_and(|user| user.bot),
            _ => self
                .member()
                .and_then(|member| member.user.as_ref())
                .is_some_and(|user| user.bot),
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = self.member().and_then(GuildMember::display_name) {
            return name.to_owned();
        }
        match self {
            Self::MessageCreate(message) => message.author.display_name().to_owned(),
            Self::InteractionCreate(interaction) => interaction
                .invoker()
                .map(|user| user.display_name().to_owned())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// 消息的纯文本内容，非消息事件为空
    pub fn plain_text(&self) -> Cow<'_, str> {
        match self {
            Self::MessageCreate(message) => Cow::Borrowed(message.content.trim()),
            _ => Cow::Borrowed(""),
        }
    }
}
