// core logic - ai, database, guards, and answers

mod agent;
mod ai;
pub mod answer;
mod db;
pub mod history;
mod safety;
pub mod seed;
mod topic;

pub use agent::{Agent, Reply};
pub use ai::{Ai, Provider, strip_fences};
pub use db::{Db, Dialect, QueryResult};
pub use safety::Safety;
pub use topic::{OFF_TOPIC_REPLY, Topic};
