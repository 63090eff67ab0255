mod api;
mod event;
mod gateway;
mod id;
mod message;

pub use api::*;
pub use event::{ComponentData, Event, GuildMember, Interaction, Message, Reaction, ReactionEmoji, Ready, User};
pub use gateway::{FATAL_CLOSE_CODES, GATEWAY_URL, GatewayPayload, Hello, intents, opcode};
pub use id::Id;
pub use message::{ActionRow, Button, ButtonStyle, Embed, EmbedField, EmbedFooter, color};
