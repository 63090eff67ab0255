pub mod bans;
pub mod fines;
pub mod history;
pub mod party;
pub mod points;
