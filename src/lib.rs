// estateql library - dubai property search in plain english

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
mod error;
pub mod logger;
pub mod output;
mod server;
pub mod tui;

pub use core::{Agent, Ai, Db, Dialect, Provider, QueryResult, Reply, Safety, Topic};
pub use error::Error;
pub use server::Server;
