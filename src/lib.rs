pub mod archive;
pub mod config;
pub mod draw;
pub mod endpoints;
pub mod feed;
pub mod form;
pub mod history;
pub mod http_cache;
pub mod http_client;
pub mod layout;
pub mod match_data;
pub mod persist;
pub mod session;
pub mod source;
pub mod state;
pub mod stats;
pub mod title;
