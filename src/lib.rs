pub mod config;
pub mod document;
pub mod entities;
pub mod extractor;
pub mod health;
pub mod import;
pub mod render;
pub mod repositories;
pub mod slug;
