//! CLI command implementations.

pub mod init;
pub mod password;
pub mod serve;
pub mod stats;
