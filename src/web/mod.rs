pub mod app;
pub mod handlers;
pub mod views;
