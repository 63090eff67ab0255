mod ban;
mod fine;
mod history;
mod pager;
mod party;
mod prefix;
mod score;

pub use ban::ban_plugin;
pub use fine::fine_plugin;
pub use history::history_plugin;
pub use pager::pager_plugin;
pub use party::party_plugin;
pub use prefix::prefix_plugin;
pub use score::score_plugin;
use warcry::chain::{Matcher, Rule};

/// 服务器内由真人发送的 `<前缀><name>` 命令
fn command(name: &'static str) -> Matcher {
    Rule::on_guild_message() & Rule::on_human() & Rule::on_command(name)
}

/// 列表类 embed 每页的条目数
const PAGE_SIZE: usize = 10;
