use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{
    Id,
    message::{ActionRow, Embed},
};

/// 发送消息的参数
#[derive(Debug, Serialize, Default, Clone, PartialEq)]
pub struct CreateMessageParams {
    /// 文本内容
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// 嵌入内容，最多 10 个
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// 交互组件
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

impl CreateMessageParams {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    pub fn with_components(mut self, components: Vec<ActionRow>) -> Self {
        self.components = components;
        self
    }
}

/// 编辑消息的参数，`None` 表示保持不变，空数组表示清空
#[derive(Debug, Serialize, Default, Clone, PartialEq)]
pub struct EditMessageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ActionRow>>,
}

/// 从消息创建子区的参数
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StartThreadParams {
    /// 子区名称
    pub name: String,
    /// 无活动后自动归档的分钟数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_archive_duration: Option<u32>,
}

/// 仅自己可见的消息
pub const EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InteractionCallbackType {
    /// 以新消息回复
    ChannelMessageWithSource = 4,
    /// 确认组件交互，不修改消息
    DeferredUpdateMessage = 6,
    /// 直接修改组件所在的消息
    UpdateMessage = 7,
}

impl Serialize for InteractionCallbackType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Serialize, Default, Clone, PartialEq)]
pub struct InteractionCallbackData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ActionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

/// 交互回调的参数
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: InteractionCallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionCallbackData>,
}

impl InteractionResponse {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: InteractionCallbackType::ChannelMessageWithSource,
            data: Some(InteractionCallbackData {
                content: Some(content.into()),
                flags: Some(EPHEMERAL),
                ..Default::default()
            }),
        }
    }

    pub fn update(embeds: Vec<Embed>, components: Vec<ActionRow>) -> Self {
        Self {
            kind: InteractionCallbackType::UpdateMessage,
            data: Some(InteractionCallbackData {
                embeds: Some(embeds),
                components: Some(components),
                ..Default::default()
            }),
        }
    }

    pub fn deferred_update() -> Self {
        Self {
            kind: InteractionCallbackType::DeferredUpdateMessage,
            data: None,
        }
    }
}

/// 列出服务器成员的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListGuildMembersParams {
    /// 1 ~ 1000
    pub limit: u16,
    /// 只返回 id 大于该值的成员，用于翻页
    pub after: Option<Id>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Role {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Channel {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl Channel {
    pub const GUILD_TEXT: u8 = 0;
}

/// 一次 REST 调用，路由按段保存，由适配器负责编码
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub route: Vec<String>,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, route: Vec<String>) -> Self {
        Self {
            method,
            route,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> serde_json::Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// 用于日志的路由描述
    pub fn path(&self) -> String {
        format!("/{}", self.route.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_response_serialize() {
        assert_eq!(
            serde_json::to_string(&InteractionResponse::ephemeral("Only the leader can start the party.")).unwrap(),
            r#"{"type":4,"data":{"content":"Only the leader can start the party.","flags":64}}"#
        );
        assert_eq!(
            serde_json::to_string(&InteractionResponse::deferred_update()).unwrap(),
            r#"{"type":6}"#
        );
    }

    #[test]
    fn test_edit_message_distinguishes_clear_and_keep() {
        let clear = EditMessageParams {
            components: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&clear).unwrap(), r#"{"components":[]}"#);
        assert_eq!(serde_json::to_string(&EditMessageParams::default()).unwrap(), "{}");
    }
}
