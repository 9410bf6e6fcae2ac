pub mod api;
pub mod book_service;
pub mod books_repository;
pub mod password_encoder;
pub mod postgres;
pub mod settings;
pub mod specimen_service;
pub mod specimens_repository;
pub mod user_service;
pub mod users_repository;

#[cfg(any(feature = "server", test))]
pub mod app_config;

#[cfg(any(feature = "server", test))]
mod handlers;
