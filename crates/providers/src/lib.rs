pub mod config;
pub mod llama;

pub use config::Settings;
