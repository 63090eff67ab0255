use std::sync::Arc;

use warcry::{
    chain::Rule,
    plugin::Plugin,
    schema::InteractionResponse,
};

use crate::{
    state::State,
    utils::pager::{Direction, Turn},
};

pub fn pager_plugin(state: Arc<State>) -> Plugin {
    let mut plugin = Plugin::new("Pager", "Previous / next buttons of paginated lists");

    plugin.on("Turn a page", i32::default(), Rule::on_component("page:"), move |ctx| {
        let state = state.clone();
        async move {
            let Some(direction) = ctx.interaction()?.custom_id().and_then(Direction::from_custom_id) else {
                return Ok(false);
            };
            let response = match state.pagers.turn(ctx.event.try_message_id()?, direction) {
                Turn::Page(embed, controls) => InteractionResponse::update(vec![embed], controls),
                Turn::Edge | Turn::Gone => InteractionResponse::deferred_update(),
            };
            ctx.respond(response).await?;
            Ok(true)
        }
    });

    plugin
}
