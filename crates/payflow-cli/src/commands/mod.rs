//! CLI subcommands

pub mod config;
pub mod debts;
pub mod list;
pub mod queue;
pub mod watch;
