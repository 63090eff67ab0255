use std::sync::LazyLock;

use regex::Regex;
use warcry::schema::Id;

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<@!?(\d+)>$").unwrap());

/// 成员参数可以是提及 `<@id>` / `<@!id>`，也可以是纯数字 id
pub fn parse_member(arg: &str) -> Option<Id> {
    let digits = match MENTION.captures(arg) {
        Some(captures) => captures.get(1)?.as_str(),
        None => arg,
    };
    digits.parse().ok()
}

/// 所有参数都必须是成员，重复的成员只保留一次
pub fn parse_members(args: &[String]) -> Option<Vec<Id>> {
    let mut members = Vec::new();
    for arg in args {
        let id = parse_member(arg)?;
        if !members.contains(&id) {
            members.push(id);
        }
    }
    Some(members)
}
