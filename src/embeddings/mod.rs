//! Query embedding generation

pub mod client;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
