use std::{borrow::Cow, ops};

use crate::{
    chain::{Matcher, split_command},
    schema::Event,
};

#[allow(clippy::enum_variant_names)]
pub enum InnerRule {
    OnEventStatic(&'static (dyn Fn(&Event) -> bool + Send + Sync)),
    OnEvent(Box<dyn Fn(&Event) -> bool + Send + Sync>),
    /// 命令规则依赖运行期的前缀，由 Matcher 负责传入
    OnCommand(&'static str),
}

pub struct Rule {
    pub(crate) name: Cow<'static, str>,
    pub(crate) inner: InnerRule,
}

impl Rule {
    pub fn on_message() -> Rule {
        Self {
            name: "on_message".into(),
            inner: InnerRule::OnEventStatic(&|event: &Event| -> bool { matches!(event, Event::MessageCreate(_)) }),
        }
    }

    pub fn on_guild_message() -> Rule {
        Self {
            name: "on_guild_message".into(),
            inner: InnerRule::OnEventStatic(&|event: &Event| -> bool {
                matches!(event, Event::MessageCreate(message) if message.guild_id.is_some())
            }),
        }
    }

    /// 过滤掉机器人账号（包括自己）触发的事件
    pub fn on_human() -> Rule {
        Self {
            name: "on_human".into(),
            inner: InnerRule::OnEventStatic(&|event: &Event| -> bool { !event.is_from_bot() }),
        }
    }

    pub fn on_reaction_add() -> Rule {
        Self {
            name: "on_reaction_add".into(),
            inner: InnerRule::OnEventStatic(&|event: &Event| -> bool { matches!(event, Event::ReactionAdd(_)) }),
        }
    }

    pub fn on_reaction_remove() -> Rule {
        Self {
            name: "on_reaction_remove".into(),
            inner: InnerRule::OnEventStatic(&|event: &Event| -> bool { matches!(event, Event::ReactionRemove(_)) }),
        }
    }

    /// 匹配 custom_id 以 `prefix` 开头的组件交互
    pub fn on_component(prefix: &'static str) -> Rule {
        Self {
            name: format!("on_component({prefix})").into(),
            inner: InnerRule::OnEvent(Box::new(move |event: &Event| -> bool {
                matches!(event, Event::InteractionCreate(interaction)
                    if interaction.custom_id().is_some_and(|id| id.starts_with(prefix)))
            })),
        }
    }

    /// 匹配 `<前缀><command>` 开头的消息
    pub fn on_command(command: &'static str) -> Rule {
        Self {
            name: format!("on_command({command})").into(),
            inner: InnerRule::OnCommand(command),
        }
    }

    pub(crate) fn is_match(&self, event: &Event, prefix: &str) -> bool {
        match &self.inner {
            InnerRule::OnEventStatic(handler) => handler(event),
            InnerRule::OnEvent(handler) => handler(event),
            InnerRule::OnCommand(command) => {
                matches!(event, Event::MessageCreate(_))
                    && split_command(&event.plain_text(), prefix).is_some_and(|(name, _)| name == *command)
            }
        }
    }
}

impl ops::BitAnd<Rule> for Rule {
    type Output = Matcher;

    fn bitand(self, rhs: Rule) -> Matcher {
        Matcher {
            condition: vec![self, rhs],
        }
    }
}
