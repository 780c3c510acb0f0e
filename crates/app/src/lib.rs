//! Store API gateway, configuration and command-line client for cartsync.

pub mod cli;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod observability;
pub mod render;

#[cfg(test)]
mod test;
