pub mod account_service;
pub mod auth_service;
pub mod conversation_service;
pub mod health_service;
pub mod message_service;
pub mod notification_service;
pub mod push;
pub mod rate_limit_service;
