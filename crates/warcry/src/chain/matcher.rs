use std::{fmt::Display, ops};

use crate::{
    chain::{Rule, rule::InnerRule},
    schema::Event,
};

#[derive(Default)]
pub struct Matcher {
    pub condition: Vec<Rule>,
}

impl Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rule in self.condition.iter().take(self.condition.len().saturating_sub(1)) {
            write!(f, "{} & ", rule.name)?;
        }
        if let Some(rule) = self.condition.last() {
            write!(f, "{}", rule.name)?;
        }
        Ok(())
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rules: Vec<Rule>) {
        self.condition.extend(rules);
    }

    pub fn is_match(&self, event: &Event, prefix: &str) -> bool {
        self.condition.iter().all(|rule| rule.is_match(event, prefix))
    }

    /// 匹配条件中的命令名，用于生成帮助信息
    pub fn command(&self) -> Option<&'static str> {
        self.condition.iter().find_map(|rule| match rule.inner {
            InnerRule::OnCommand(command) => Some(command),
            _ => None,
        })
    }
}

impl ops::BitAnd<Matcher> for Matcher {
    type Output = Self;

    fn bitand(self, rhs: Matcher) -> Self::Output {
        Self {
            condition: self.condition.into_iter().chain(rhs.condition).collect(),
        }
    }
}

impl ops::BitAnd<Rule> for Matcher {
    type Output = Self;

    fn bitand(mut self, rhs: Rule) -> Self::Output {
        self.add(vec![rhs]);
        self
    }
}

impl From<Rule> for Matcher {
    fn from(rule: Rule) -> Self {
        Self { condition: vec![rule] }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(content: &str, bot: bool) -> Event {
        Event::from_dispatch(
            "MESSAGE_CREATE",
            json!({
                "id": "1", "channel_id": "2", "guild_id": "3",
                "author": {"id": "4", "username": "someone", "bot": bot},
                "content": content
            }),
        )
        .unwrap()
        .unwrap()
    }

    fn component(custom_id: &str) -> Event {
        Event::from_dispatch(
            "INTERACTION_CREATE",
            json!({
                "id": "1", "application_id": "2", "type": 3, "token": "t",
                "user": {"id": "4", "username": "someone"},
                "data": {"custom_id": custom_id, "component_type": 2}
            }),
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_command_uses_runtime_prefix() {
        let matcher = Rule::on_human() & Rule::on_command("score");
        assert!(matcher.is_match(&message("!score <@1> 5", false), "!"));
        assert!(matcher.is_match(&message("?score", false), "?"));
        assert!(!matcher.is_match(&message("!score", false), "?"));
        assert!(!matcher.is_match(&message("!scores", false), "!"));
        assert!(!matcher.is_match(&message("!score", true), "!"));
        assert_eq!(matcher.command(), Some("score"));
        assert_eq!(matcher.to_string(), "on_human & on_command(score)");
    }

    #[test]
    fn test_component_prefix() {
        let matcher: Matcher = Rule::on_component("party:").into();
        assert!(matcher.is_match(&component("party:start"), "!"));
        assert!(!matcher.is_match(&component("page:next"), "!"));
        assert!(!matcher.is_match(&message("party:start", false), "!"));
        assert_eq!(matcher.command(), None);
    }
}
