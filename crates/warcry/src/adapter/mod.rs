use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
mod error;
mod gateway;

pub use error::ConnectError;
pub use gateway::GatewayAdapter;

use crate::{
    caller,
    chain::{Context, MatchUnion, Prefix},
    plugin::Plugin,
    schema::*,
};

#[async_trait]
pub trait Connector: Send + Sync {
    async fn spawn(self: Box<Self>, plugins: Vec<Plugin>, prefix: Prefix) -> Result<()>;
}

/// REST 调用入口，实现方只需提供 `call`，其余方法都是对 [`caller`] 的封装
#[async_trait]
pub trait Caller: Send + Sync {
    async fn call(&self, request: ApiRequest) -> Result<Value>;

    async fn create_message(&self, channel_id: Id, param: CreateMessageParams) -> Result<Message> {
        caller::create_message(self, channel_id, param).await
    }

    async fn edit_message(&self, channel_id: Id, message_id: Id, param: EditMessageParams) -> Result<Message> {
        caller::edit_message(self, channel_id, message_id, param).await
    }

    async fn create_reaction(&self, channel_id: Id, message_id: Id, emoji: &str) -> Result<()> {
        caller::create_reaction(self, channel_id, message_id, emoji).await
    }

    async fn delete_all_reactions(&self, channel_id: Id, message_id: Id) -> Result<()> {
        caller::delete_all_reactions(self, channel_id, message_id).await
    }

    async fn start_thread_from_message(&self, channel_id: Id, message_id: Id, param: StartThreadParams) -> Result<Channel> {
        caller::start_thread_from_message(self, channel_id, message_id, param).await
    }

    async fn create_interaction_response(&self, interaction: &Interaction, param: InteractionResponse) -> Result<()> {
        caller::create_interaction_response(self, interaction, param).await
    }

    async fn get_guild_member(&self, guild_id: Id, user_id: Id) -> Result<GuildMember> {
        caller::get_guild_member(self, guild_id, user_id).await
    }

    async fn list_all_guild_members(&self, guild_id: Id) -> Result<Vec<GuildMember>> {
        caller::list_all_guild_members(self, guild_id).await
    }

    async fn get_guild_roles(&self, guild_id: Id) -> Result<Vec<Role>> {
        caller::get_guild_roles(self, guild_id).await
    }

    async fn get_guild_channels(&self, guild_id: Id) -> Result<Vec<Channel>> {
        caller::get_guild_channels(self, guild_id).await
    }
}

#[async_trait]
pub trait Adapter: Connector + Caller {}

pub(crate) fn extract_match_unions(plugins: &[Plugin]) -> Vec<Arc<MatchUnion>> {
    // 每个插件都有自己的 MatchUnion，但处理时不按插件分割，而是统一按照优先级排序处理
    // 将排序过程提前，避免在处理任务中重复排序（引入的代价就是 MatchUnion 需要用 Arc 包装）
    let mut match_unions = plugins
        .iter()
        .flat_map(|plugin| plugin.match_unions())
        .cloned()
        .collect::<Vec<_>>();
    // 优先级从大到小排序
    match_unions.sort_by(|a, b| b.priority.cmp(&a.priority));
    match_unions
}

/// 按照优先级顺序匹配并处理事件，返回真正执行过的处理器数量
pub(crate) async fn dispatch(match_unions: &[Arc<MatchUnion>], context: Context) -> usize {
    let prefix = context.prefix.get();
    let mut handled = 0;
    for match_union in match_unions {
        if !match_union.matcher.is_match(&context.event, &prefix) {
            continue;
        }
        handled += 1;
        match (*match_union.handler)(context.clone()).await {
            // 事件的返回值被视为中断标志，如果返回 true 则不再继续匹配
            Err(e) => error!("Failed to handle {} with {}: {e:?}", context.event.name(), match_union.description),
            Ok(true) => break,
            _ => (),
        }
    }
    handled
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;

    use super::*;
    use crate::chain::Rule;

    struct Silent;

    #[async_trait]
    impl Caller for Silent {
        async fn call(&self, _request: ApiRequest) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn message_event(content: &str) -> Event {
        Event::from_dispatch(
            "MESSAGE_CREATE",
            json!({
                "id": "1", "channel_id": "2", "guild_id": "3",
                "author": {"id": "4", "username": "member"},
                "content": content
            }),
        )
        .unwrap()
        .unwrap()
    }

    fn context(event: Event, plugins: Arc<Vec<Plugin>>) -> Context {
        Context {
            caller: Arc::new(Silent),
            event: Arc::new(event),
            plugins,
            prefix: Prefix::new("!"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_stops_on_true() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut plugin = Plugin::new("test", "test");
        for (name, priority, stop) in [("low", 0, false), ("high", 10, true), ("middle", 5, false)] {
            let order = order.clone();
            plugin.on(name, priority, Rule::on_command("ping"), move |_| {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push(name);
                    Ok(stop)
                }
            });
        }
        let plugins = Arc::new(vec![plugin]);
        let match_unions = extract_match_unions(&plugins);
        let handled = dispatch(&match_unions, context(message_event("!ping"), plugins.clone())).await;
        assert_eq!(handled, 1);
        assert_eq!(*order.lock().unwrap(), vec!["high"]);
    }

    #[tokio::test]
    async fn test_dispatch_continues_after_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut plugin = Plugin::new("test", "test");
        plugin.on("broken", 1, Rule::on_message(), |_| async { Err(anyhow::anyhow!("boom")) });
        let counter_clone = counter.clone();
        plugin.on("counter", 0, Rule::on_message(), move |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
        });
        let plugins = Arc::new(vec![plugin]);
        let match_unions = extract_match_unions(&plugins);
        let handled = dispatch(&match_unions, context(message_event("hello"), plugins.clone())).await;
        assert_eq!(handled, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
