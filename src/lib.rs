pub mod cli;
pub mod core;
pub mod editor;
pub mod error;
pub mod export;
pub mod notification;
pub mod persistence;
pub mod session;
pub mod skills;
pub mod template_processor;
pub mod template_system;
pub mod utils;
pub mod web;

pub use web::start_web_server;
