pub mod auth;
pub mod invitation_service;
pub mod notification;
pub mod onboarding_service;
pub mod session_service;
pub mod token_store;
pub mod user_service;
