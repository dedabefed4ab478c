pub mod adapter;
pub mod admin;
pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod service;
