pub mod client;
pub mod config;
pub mod lazy;

pub use client::LlamaClient;
pub use config::LlamaConfig;
pub use lazy::LazyLlama;
