#[macro_use]
extern crate tracing;

pub mod adapter;
pub mod bot;
pub mod caller;
pub mod chain;
pub mod error;
pub mod plugin;
pub mod schema;
