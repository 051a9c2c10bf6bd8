//! High-level driver for device interaction.
//!
//! The driver layer sends commands over an interactive shell and returns
//! their normalized output.

mod builder;
mod generic;
mod response;

pub use builder::DriverBuilder;
pub use generic::{GenericDriver, ShellChannel};
pub use response::Response;
