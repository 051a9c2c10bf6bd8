//! Built-in platform definitions.

pub mod cisco;
