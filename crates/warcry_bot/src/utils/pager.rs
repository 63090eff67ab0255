use std::time::{Duration, Instant};

use anyhow::Result;
use dashmap::DashMap;
use warcry::{
    chain::Context,
    schema::{ActionRow, Button, ButtonStyle, CreateMessageParams, Embed, Id},
};

pub const PAGER_TTL: Duration = Duration::from_secs(180);
pub const PREV: &str = "page:prev";
pub const NEXT: &str = "page:next";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            PREV => Some(Self::Prev),
            NEXT => Some(Self::Next),
            _ => None,
        }
    }
}

struct Pager {
    pages: Vec<Embed>,
    index: usize,
    created: Instant,
}

/// 翻页的结果
#[derive(Debug, PartialEq)]
pub enum Turn {
    Page(Embed, Vec<ActionRow>),
    /// 已在首页或末页
    Edge,
    /// 不存在或已过期
    Gone,
}

/// 以消息 id 为键保存的分页列表
pub struct Pagers {
    inner: DashMap<Id, Pager>,
    ttl: Duration,
}

impl Default for Pagers {
    fn default() -> Self {
        Self::with_ttl(PAGER_TTL)
    }
}

impl Pagers {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: DashMap::new(),
            ttl,
        }
    }

    /// 每页的页脚写上页码
    pub fn number(pages: Vec<Embed>) -> Vec<Embed> {
        let total = pages.len();
        pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| page.footer(format!("Page {}/{total}", index + 1)))
            .collect()
    }

    pub fn controls(index: usize, total: usize) -> Vec<ActionRow> {
        vec![ActionRow::new(vec![
            Button::new(ButtonStyle::Primary, "⬅️ Previous", PREV).disabled(index == 0),
            Button::new(ButtonStyle::Primary, "➡️ Next", NEXT).disabled(index + 1 >= total),
        ])]
    }

    /// 发送第一页，不止一页时附带翻页按钮并登记
    pub async fn send(&self, ctx: &Context, pages: Vec<Embed>) -> Result<()> {
        let mut pages = Self::number(pages);
        let total = pages.len();
        match total {
            0 => return Ok(()),
            1 => {
                ctx.send_embed(pages.swap_remove(0)).await?;
            }
            _ => {
                let params = CreateMessageParams::embed(pages[0].clone()).with_components(Self::controls(0, total));
                let message = ctx.send_message(params).await?;
                self.insert(message.id, pages);
            }
        }
        Ok(())
    }

    pub fn insert(&self, message_id: Id, pages: Vec<Embed>) {
        self.purge();
        self.inner.insert(
            message_id,
            Pager {
                pages,
                index: 0,
                created: Instant::now(),
            },
        );
    }

    pub fn turn(&self, message_id: Id, direction: Direction) -> Turn {
        self.turn_at(message_id, direction, Instant::now())
    }

    fn turn_at(&self, message_id: Id, direction: Direction, now: Instant) -> Turn {
        let ttl = self.ttl;
        if self
            .inner
            .remove_if(&message_id, |_, pager| now.duration_since(pager.created) > ttl)
            .is_some()
        {
            return Turn::Gone;
        }
        let Some(mut pager) = self.inner.get_mut(&message_id) else {
            return Turn::Gone;
        };
        let index = match direction {
            Direction::Prev => pager.index.checked_sub(1),
            Direction::Next => Some(pager.index + 1).filter(|index| *index < pager.pages.len()),
        };
        let Some(index) = index else {
            return Turn::Edge;
        };
        pager.index = index;
        Turn::Page(pager.pages[index].clone(), Self::controls(index, pager.pages.len()))
    }

    fn purge(&self) {
        let now = Instant::now();
        self.inner
            .retain(|_, pager| now.duration_since(pager.created) <= self.ttl);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn pages(n: usize) -> Vec<Embed> {
        Pagers::number((1..=n).map(|i| Embed::new(format!("page {i}"))).collect())
    }

    #[test]
    fn test_turn_within_bounds() {
        let pagers = Pagers::default();
        pagers.insert(Id(1), pages(3));
        assert_matches!(pagers.turn(Id(1), Direction::Prev), Turn::Edge);
        assert_matches!(pagers.turn(Id(1), Direction::Next), Turn::Page(embed, _) if embed.title.as_deref() == Some("page 2"));
        assert_matches!(pagers.turn(Id(1), Direction::Next), Turn::Page(embed, rows) => {
            assert_eq!(embed.footer.unwrap().text, "Page 3/3");
            assert_eq!(rows, Pagers::controls(2, 3));
        });
        assert_matches!(pagers.turn(Id(1), Direction::Next), Turn::Edge);
        assert_matches!(pagers.turn(Id(2), Direction::Next), Turn::Gone);
    }

    #[test]
    fn test_expired_pager_is_dropped() {
        let pagers = Pagers::with_ttl(Duration::from_secs(180));
        pagers.insert(Id(1), pages(2));
        let later = Instant::now() + Duration::from_secs(181);
        assert_matches!(pagers.turn_at(Id(1), Direction::Next, later), Turn::Gone);
        assert!(pagers.inner.is_empty());
    }

    #[test]
    fn test_controls_disable_edges() {
        let serialized = serde_json::to_value(Pagers::controls(0, 2)).unwrap();
        assert_eq!(serialized[0]["components"][0]["disabled"], true);
        assert_eq!(serialized[0]["components"][1]["disabled"], false);
        assert_eq!(serialized[0]["components"][1]["custom_id"], NEXT);
    }

    #[test]
    fn test_direction_from_custom_id() {
        assert_eq!(Direction::from_custom_id(PREV), Some(Direction::Prev));
        assert_eq!(Direction::from_custom_id("party:start"), None);
    }
}
