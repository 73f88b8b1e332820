pub mod chat;
pub mod classify;
pub mod index;
pub mod recommend;
pub mod status;
