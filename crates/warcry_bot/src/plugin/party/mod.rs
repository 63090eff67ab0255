mod render;

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use warcry::{
    chain::{Context, Rule},
    plugin::Plugin,
    schema::{CreateMessageParams, EditMessageParams, Id, InteractionResponse, StartThreadParams},
};

use crate::{
    model::{
        history::HistoryEntry,
        party::{Enrollee, PartyError, PartyRole, PartySession, parse_schedule},
    },
    permission::Tier,
    plugin::command,
    state::State,
    utils::member::display_name,
};
use render::{FINISH, PENALTY_DOWN, PENALTY_UP, RoleLinks, START, Standings, controls, render_board, role_links};

/// 一个正在进行的队伍及其面板所在的位置
#[derive(Debug, Clone)]
struct Board {
    session: PartySession,
    channel_id: Id,
    links: RoleLinks,
}

/// 面板消息 id -> 队伍，只保存在内存中
type Registry = Arc<DashMap<Id, Board>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    PenaltyUp,
    PenaltyDown,
    Finish,
}

impl Action {
    fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            START => Some(Self::Start),
            PENALTY_UP => Some(Self::PenaltyUp),
            PENALTY_DOWN => Some(Self::PenaltyDown),
            FINISH => Some(Self::Finish),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Outcome {
    /// 重新渲染面板，附带提示时以仅自己可见的消息确认
    Update(Option<&'static str>),
    Finalized(HistoryEntry),
    Reject(&'static str),
    /// 只确认交互，不做修改
    Ignore,
}

fn apply(session: &mut PartySession, action: Action, actor: Id) -> Outcome {
    let res = match action {
        Action::Start => session.start(actor).map(|_| Outcome::Update(Some("⚔️ Party started."))),
        Action::PenaltyUp => session.raise_penalty(actor).map(|_| Outcome::Update(None)),
        Action::PenaltyDown => session.lower_penalty(actor).map(|_| Outcome::Update(None)),
        Action::Finish => session.finalize(actor).map(Outcome::Finalized),
    };
    match res {
        Ok(outcome) => outcome,
        Err(PartyError::Closed) => Outcome::Ignore,
        Err(PartyError::NotLeader) => Outcome::Reject("⛔ Only the party leader can use these controls."),
        Err(PartyError::PenaltyFloor) => Outcome::Reject("⚠️ The penalty cannot go below 0."),
        Err(PartyError::AlreadyStarted) => Outcome::Reject("⚠️ The party has already started."),
    }
}

async fn refresh(ctx: &Context, state: &State, message_id: Id, board: &Board) -> Result<()> {
    let standings = Standings::load(&state.store).await?;
    ctx.caller
        .edit_message(
            board.channel_id,
            message_id,
            EditMessageParams {
                embeds: Some(vec![render_board(&board.session, &board.links, &standings)]),
                components: Some(controls(&board.session)),
                ..Default::default()
            },
        )
        .await?;
    Ok(())
}

/// 扣除积分并归档，返回实际被扣分的成员
async fn settle(state: &State, entry: HistoryEntry) -> Result<Vec<Id>> {
    let mut points = state.store.points.load().await?;
    let affected = points.deduct(entry.members().map(|member| member.id), entry.penalty);
    state.store.points.save(&points).await?;
    let mut history = state.store.history.load().await?;
    history.record(entry);
    state.store.history.save(&history).await?;
    Ok(affected)
}

/// 先结算再移出注册表，结算失败时恢复结束前的队伍，队长可以再次结束
async fn finish(
    state: &State,
    registry: &Registry,
    message_id: Id,
    entry: HistoryEntry,
    previous: PartySession,
) -> Result<Vec<Id>> {
    match settle(state, entry).await {
        Ok(affected) => {
            registry.remove(&message_id);
            Ok(affected)
        }
        Err(e) => {
            if let Some(mut board) = registry.get_mut(&message_id) {
                board.session = previous;
            }
            Err(e)
        }
    }
}

pub fn party_plugin(state: Arc<State>) -> Plugin {
    let mut plugin = Plugin::new("World Boss", "World Boss party sign-up");
    let registry: Registry = Arc::new(DashMap::new());

    let (state_clone, registry_clone) = (state.clone(), registry.clone());
    plugin.on(
        "[Leaders] Open a World Boss party: wb HHMM",
        i32::default(),
        command("wb"),
        move |ctx| {
            let (state, registry) = (state_clone.clone(), registry_clone.clone());
            async move {
                if !state.permissions.ensure(&ctx, Tier::Leader).await? {
                    return Ok(true);
                }
                let Some(time) = ctx.args().first().and_then(|arg| parse_schedule(arg)) else {
                    let prefix = ctx.prefix.get();
                    ctx.send(format!("❌ Usage: `{prefix}wb HHMM` (UTC), for example `{prefix}wb 1800`."))
                        .await?;
                    return Ok(true);
                };
                let (guild_id, channel_id) = (ctx.event.try_guild_id()?, ctx.event.try_channel_id()?);
                let date = chrono::Utc::now().format("%d/%m/%Y").to_string();
                let session = PartySession::new(ctx.event.try_user_id()?, time, date);
                let links = role_links(guild_id, &ctx.caller.get_guild_channels(guild_id).await?);
                let standings = Standings::load(&state.store).await?;
                let message = ctx
                    .send_message(
                        CreateMessageParams::embed(render_board(&session, &links, &standings))
                            .with_components(controls(&session)),
                    )
                    .await?;
                let title = format!("WB {} - Discussion", session.formatted_time());
                info!("Party {} opened by {} for {}", message.id, session.leader_id, session.time);
                registry.insert(
                    message.id,
                    Board {
                        session,
                        channel_id,
                        links,
                    },
                );
                for role in PartyRole::ALL {
                    ctx.caller.create_reaction(channel_id, message.id, role.emoji()).await?;
                }
                ctx.caller
                    .start_thread_from_message(
                        channel_id,
                        message.id,
                        StartThreadParams {
                            name: title,
                            auto_archive_duration: None,
                        },
                    )
                    .await?;
                Ok(true)
            }
        },
    );

    let (state_clone, registry_clone) = (state.clone(), registry.clone());
    plugin.on(
        "Pick a role by reacting",
        i32::default(),
        Rule::on_reaction_add() & Rule::on_human(),
        move |ctx| {
            let (state, registry) = (state_clone.clone(), registry_clone.clone());
            async move {
                let Some(reaction) = ctx.event.as_reaction_add() else {
                    return Ok(false);
                };
                let Some(role) = PartyRole::from_emoji(&reaction.emoji.as_key()) else {
                    return Ok(false);
                };
                if !registry.contains_key(&reaction.message_id) {
                    return Ok(false);
                }
                let name = match reaction.member.as_ref().and_then(|member| member.display_name()) {
                    Some(name) => name.to_owned(),
                    None => display_name(ctx.caller.as_ref(), ctx.event.try_guild_id()?, reaction.user_id).await,
                };
                let board = {
                    let Some(mut board) = registry.get_mut(&reaction.message_id) else {
                        return Ok(false);
                    };
                    // 重复点同一个职位不需要重新渲染
                    if board.session.role_of(reaction.user_id) == Some(role) {
                        return Ok(true);
                    }
                    let member = Enrollee {
                        id: reaction.user_id,
                        name,
                    };
                    if board.session.pick(member, role).is_err() {
                        return Ok(true);
                    }
                    board.clone()
                };
                refresh(&ctx, &state, reaction.message_id, &board).await?;
                Ok(true)
            }
        },
    );

    let (state_clone, registry_clone) = (state.clone(), registry.clone());
    plugin.on(
        "Leave a role by removing the reaction",
        i32::default(),
        Rule::on_reaction_remove() & Rule::on_human(),
        move |ctx| {
            let (state, registry) = (state_clone.clone(), registry_clone.clone());
            async move {
                let Some(reaction) = ctx.event.as_reaction_remove() else {
                    return Ok(false);
                };
                if PartyRole::from_emoji(&reaction.emoji.as_key()).is_none() {
                    return Ok(false);
                }
                let board = {
                    let Some(mut board) = registry.get_mut(&reaction.message_id) else {
                        return Ok(false);
                    };
                    // 只有真的退出了职位才需要重新渲染
                    if !board.session.unpick(reaction.user_id).unwrap_or(false) {
                        return Ok(true);
                    }
                    board.clone()
                };
                refresh(&ctx, &state, reaction.message_id, &board).await?;
                Ok(true)
            }
        },
    );

    plugin.on(
        "Party leader controls",
        i32::default(),
        Rule::on_component("party:"),
        move |ctx| {
            let (state, registry) = (state.clone(), registry.clone());
            async move {
                let Some(action) = ctx.interaction()?.custom_id().and_then(Action::from_custom_id) else {
                    return Ok(false);
                };
                let (message_id, actor) = (ctx.event.try_message_id()?, ctx.event.try_user_id()?);
                let resolved = registry.get_mut(&message_id).map(|mut board| {
                    let previous = board.session.clone();
                    let outcome = apply(&mut board.session, action, actor);
                    (outcome, board.clone(), previous)
                });
                let Some((outcome, board, previous)) = resolved else {
                    ctx.respond(InteractionResponse::deferred_update()).await?;
                    return Ok(true);
                };
                match outcome {
                    Outcome::Ignore => ctx.respond(InteractionResponse::deferred_update()).await?,
                    Outcome::Reject(text) => ctx.respond_ephemeral(text).await?,
                    Outcome::Update(None) => {
                        let standings = Standings::load(&state.store).await?;
                        ctx.respond(InteractionResponse::update(
                            vec![render_board(&board.session, &board.links, &standings)],
                            controls(&board.session),
                        ))
                        .await?
                    }
                    Outcome::Update(Some(notice)) => {
                        ctx.caller.delete_all_reactions(board.channel_id, message_id).await?;
                        refresh(&ctx, &state, message_id, &board).await?;
                        ctx.respond_ephemeral(notice).await?
                    }
                    Outcome::Finalized(entry) => {
                        let penalty = entry.penalty;
                        let affected = finish(&state, &registry, message_id, entry, previous).await?;
                        refresh(&ctx, &state, message_id, &board).await?;
                        info!("Party {message_id} finished, {penalty} points deducted from {affected:?}");
                        let members = if affected.is_empty() {
                            "no registered members".to_owned()
                        } else {
                            affected.iter().map(|id| id.mention()).collect::<Vec<_>>().join(", ")
                        };
                        ctx.send(format!("✅ {penalty} points were deducted from: {members}")).await?;
                        ctx.respond_ephemeral("✅ Party finished.").await?
                    }
                }
                Ok(true)
            }
        },
    );

    plugin
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const LEADER: Id = Id(100);

    fn session() -> PartySession {
        let mut session = PartySession::new(LEADER, "1800", "02/03/2025");
        for (id, role) in [(1, PartyRole::Maintank), (2, PartyRole::Healer), (3, PartyRole::Scout)] {
            session
                .pick(
                    Enrollee {
                        id: Id(id),
                        name: format!("member-{id}"),
                    },
                    role,
                )
                .unwrap();
        }
        session
    }

    #[test]
    fn test_action_from_custom_id() {
        assert_eq!(Action::from_custom_id("party:start"), Some(Action::Start));
        assert_eq!(Action::from_custom_id("party:finish"), Some(Action::Finish));
        assert_eq!(Action::from_custom_id("page:next"), None);
    }

    #[test]
    fn test_non_leader_is_rejected() {
        let mut session = session();
        for action in [Action::Start, Action::PenaltyUp, Action::PenaltyDown, Action::Finish] {
            assert_matches!(apply(&mut session, action, Id(1)), Outcome::Reject(_));
        }
        assert_eq!(session, self::session());
    }

    #[test]
    fn test_leader_drives_session() {
        let mut session = session();
        assert_eq!(apply(&mut session, Action::PenaltyDown, LEADER), Outcome::Reject("⚠️ The penalty cannot go below 0."));
        assert_eq!(apply(&mut session, Action::Start, LEADER), Outcome::Update(Some("⚔️ Party started.")));
        assert_matches!(apply(&mut session, Action::Start, LEADER), Outcome::Reject(_));
        assert_eq!(apply(&mut session, Action::PenaltyUp, LEADER), Outcome::Update(None));
        assert_eq!(apply(&mut session, Action::PenaltyUp, LEADER), Outcome::Update(None));
        assert_eq!(apply(&mut session, Action::PenaltyDown, LEADER), Outcome::Update(None));
        assert_matches!(apply(&mut session, Action::Finish, LEADER), Outcome::Finalized(entry) => {
            assert_eq!(entry.penalty, 1);
            assert_eq!(entry.members().count(), 3);
        });
        assert_eq!(apply(&mut session, Action::PenaltyUp, LEADER), Outcome::Ignore);
        assert_eq!(apply(&mut session, Action::Finish, LEADER), Outcome::Ignore);
    }

    async fn finalized(dir: &std::path::Path) -> (State, Registry, PartySession, HistoryEntry) {
        let state = State::new(
            crate::store::Store::open(dir).await.unwrap(),
            crate::permission::Permissions::new("Party Leader", "Member"),
        );
        let registry: Registry = Arc::new(DashMap::new());
        let previous = session();
        let mut closed = previous.clone();
        let entry = closed.finalize(LEADER).unwrap();
        registry.insert(
            Id(7),
            Board {
                session: closed,
                channel_id: Id(8),
                links: RoleLinks::new(),
            },
        );
        (state, registry, previous, entry)
    }

    #[tokio::test]
    async fn test_finish_removes_settled_party() {
        let dir = tempfile::tempdir().unwrap();
        let (state, registry, previous, entry) = finalized(dir.path()).await;
        finish(&state, &registry, Id(7), entry, previous).await.unwrap();
        assert!(!registry.contains_key(&Id(7)));
        assert_eq!(state.store.history.load().await.unwrap().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_settlement_keeps_party_open() {
        let dir = tempfile::tempdir().unwrap();
        let (state, registry, previous, entry) = finalized(dir.path()).await;
        tokio::fs::write(dir.path().join("scores.json"), b"[broken").await.unwrap();
        assert!(finish(&state, &registry, Id(7), entry, previous.clone()).await.is_err());

        let mut board = registry.get_mut(&Id(7)).unwrap();
        assert_eq!(board.session, previous);
        assert_matches!(apply(&mut board.session, Action::Finish, LEADER), Outcome::Finalized(_));
        drop(board);
        assert!(state.store.history.load().await.unwrap().entries().is_empty());
    }

    #[tokio::test]
    async fn test_settle_skips_unregistered_members() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::new(
            crate::store::Store::open(dir.path()).await.unwrap(),
            crate::permission::Permissions::new("Party Leader", "Member"),
        );
        let mut points = crate::model::points::PointLedger::default();
        points.adjust(Id(1), 10);
        points.adjust(Id(3), 4);
        state.store.points.save(&points).await.unwrap();

        let mut session = session();
        session.raise_penalty(LEADER).unwrap();
        session.raise_penalty(LEADER).unwrap();
        let entry = session.finalize(LEADER).unwrap();
        let affected = settle(&state, entry).await.unwrap();
        assert_eq!(affected, vec![Id(1), Id(3)]);

        let points = state.store.points.load().await.unwrap();
        assert_eq!(points.current(Id(1)), 8);
        assert_eq!(points.get(Id(3)).unwrap().spent, 2);
        assert!(points.get(Id(2)).is_none());
        let history = state.store.history.load().await.unwrap();
        assert_eq!(history.entries().len(), 1);
        assert_eq!(history.entries()[0].penalty, 2);
    }
}
