//! SSH transport layer wrapping russh.
//!
//! Connection setup, password authentication and PTY channel creation.

pub mod config;
mod ssh;

pub use config::{HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
