pub mod auth_config;
pub mod engine;
pub mod entity;
pub mod matrix;
pub mod presets;
