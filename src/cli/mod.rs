//! CLI command implementations

pub mod achievements;
pub mod context;
pub mod init;
pub mod share;
pub mod status;
