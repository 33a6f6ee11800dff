//! DataHub service: configuration, command line and HTTP surface over
//! [`datahub_store`].

pub mod cli;
pub mod config;
pub mod http;
