//! Cross-crate integration flows.

pub mod fixtures;

mod binlog_migration;
mod fanout;
mod login_flow;
mod remote_routing;
