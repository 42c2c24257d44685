pub mod augment;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod extract;
pub mod host;
pub mod index;
pub mod invoke;
pub mod rpc;
pub mod session;
pub mod tools;
