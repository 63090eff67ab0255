use std::{borrow::Cow, future::Future, sync::Arc};

use anyhow::Result;

use crate::chain::{Context, MatchUnion, Matcher};

/// 一组相关的处理器，`help` 以插件为单位列出命令
pub struct Plugin {
    pub name: Cow<'static, str>,
    pub description: Cow<'static, str>,
    match_unions: Vec<Arc<MatchUnion>>,
}

impl Plugin {
    pub fn new(name: impl Into<Cow<'static, str>>, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            match_unions: Vec::new(),
        }
    }

    /// 注册处理器，priority 越大越先执行
    ///
    /// 处理器返回 `Ok(true)` 表示事件已被消费，后续处理器不再执行；
    /// 对于命令类的 matcher，description 会出现在 `help` 中
    pub fn on<D, M, H, Fut>(&mut self, description: D, priority: i32, matcher: M, handler: H)
    where
        D: Into<Cow<'static, str>>,
        M: Into<Matcher>,
        H: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.match_unions.push(Arc::new(MatchUnion::new(
            description.into(),
            priority,
            matcher.into(),
            Box::new(move |ctx| Box::pin(handler(ctx))),
        )));
    }

    /// 由命令触发的处理器，按注册顺序给出 (命令名, 描述)
    pub fn commands(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.match_unions
            .iter()
            .filter_map(|mu| mu.matcher.command().map(|command| (command, mu.description.as_ref())))
    }

    pub(crate) fn match_unions(&self) -> &[Arc<MatchUnion>] {
        &self.match_unions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Rule;

    #[test]
    fn test_commands_skip_listeners() {
        let mut plugin = Plugin::new("Scores", "Guild points ledger");
        plugin.on("Own points", 0, Rule::on_guild_message() & Rule::on_command("score"), |_| async {
            Ok(true)
        });
        plugin.on("Reaction listener", 0, Rule::on_reaction_add(), |_| async { Ok(false) });
        plugin.on("Top 10", 0, Rule::on_command("ranking"), |_| async { Ok(true) });
        assert_eq!(
            plugin.commands().collect::<Vec<_>>(),
            vec![("score", "Own points"), ("ranking", "Top 10")]
        );
        assert_eq!(plugin.match_unions().len(), 3);
    }
}
