pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod history;
pub mod pipeline;
pub mod ranker;
pub mod refresh;
pub mod scorer;
pub mod store;
pub mod types;
