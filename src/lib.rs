pub mod auth;
pub mod config;
pub mod domain;
pub mod export;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod terminal;
