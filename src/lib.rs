pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod identity;
pub mod migrate;
pub mod model;
pub mod replay;
pub mod rt;
pub mod zammad;
