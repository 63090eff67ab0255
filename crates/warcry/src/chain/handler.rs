use std::{future::Future, pin::Pin, sync::Arc};

use anyhow::{Result, anyhow};

use crate::{
    adapter::Caller,
    chain::{Prefix, split_command},
    plugin::Plugin,
    schema::{CreateMessageParams, Embed, Event, Interaction, InteractionResponse, Message},
};

#[derive(Clone)]
pub struct Context {
    pub caller: Arc<dyn Caller>,
    pub event: Arc<Event>,
    pub plugins: Arc<Vec<Plugin>>,
    pub prefix: Prefix,
}

pub type Handler = Box<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Result<bool>> + Send>> + Send + Sync>;

impl Context {
    /// 命令名之后的参数，按空白切分
    pub fn args(&self) -> Vec<String> {
        let text = self.event.plain_text();
        split_command(&text, &self.prefix.get())
            .map(|(_, rest)| rest.split_whitespace().map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    }

    /// 在事件所在的频道发送消息
    pub async fn send_message(&self, param: CreateMessageParams) -> Result<Message> {
        self.caller.create_message(self.event.try_channel_id()?, param).await
    }

    pub async fn send(&self, text: impl Into<String>) -> Result<Message> {
        self.send_message(CreateMessageParams::text(text)).await
    }

    pub async fn send_embed(&self, embed: Embed) -> Result<Message> {
        self.send_message(CreateMessageParams::embed(embed)).await
    }

    pub fn interaction(&self) -> Result<&Interaction> {
        self.event
            .as_interaction_create()
            .ok_or_else(|| anyhow!("{} is not an interaction", self.event.name()))
    }

    pub async fn respond(&self, response: InteractionResponse) -> Result<()> {
        self.caller.create_interaction_response(self.interaction()?, response).await
    }

    /// 只有交互者本人可见的回复
    pub async fn respond_ephemeral(&self, text: impl Into<String>) -> Result<()> {
        self.respond(InteractionResponse::ephemeral(text)).await
    }
}
