pub mod args;
pub mod member;
pub mod pager;
