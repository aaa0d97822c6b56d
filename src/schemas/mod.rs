pub mod common;
pub mod meta;
