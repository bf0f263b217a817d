pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod events;
pub mod home;
pub mod notifications;
pub mod threads;
