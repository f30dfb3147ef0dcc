pub mod auth;
pub mod auth_session;
pub mod conversation;
pub mod history;
pub mod message;
pub mod notification;
pub mod user;
