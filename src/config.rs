use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Path to the serialized vector index
    pub index_path: String,
    /// Path to the tab-separated product table
    pub catalog_path: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_rerank_top")]
    pub rerank_top: usize,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_top_k() -> usize {
    50
}

fn default_rerank_top() -> usize {
    5
}

fn default_max_context_chars() -> usize {
    3500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Embedding provider: "ollama" or "openai"
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Base URL of the cross-encoder sidecar
    pub endpoint: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llm_endpoint: String,
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default)]
    pub enabled: bool,
}

fn default_llm_model() -> String {
    "gemma3:27b".to_string()
}

fn default_max_tokens() -> usize {
    1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub retrieval: RetrievalConfig,
    pub embeddings: EmbeddingsConfig,
    pub reranker: RerankerConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            println!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::ProdragError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Get vector index path
    pub fn index_path(&self) -> &str {
        &self.retrieval.index_path
    }

    /// Get product catalog path
    pub fn catalog_path(&self) -> &str {
        &self.retrieval.catalog_path
    }

    /// Get default retrieval depth
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Get default rerank truncation
    pub fn rerank_top(&self) -> usize {
        self.retrieval.rerank_top
    }

    /// Get context character budget
    pub fn max_context_chars(&self) -> usize {
        self.retrieval.max_context_chars
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Check if cross-encoder reranking is enabled
    pub fn reranker_enabled(&self) -> bool {
        self.reranker.enabled
    }

    /// Check if LLM answer generation is enabled
    pub fn llm_enabled(&self) -> bool {
        self.llm.enabled
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_cors: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            retrieval: RetrievalConfig {
                index_path: "data/products.index.json".to_string(),
                catalog_path: "data/products.tsv".to_string(),
                top_k: 50,
                rerank_top: 5,
                max_context_chars: 3500,
            },
            embeddings: EmbeddingsConfig {
                provider: "ollama".to_string(),
                endpoint: "http://localhost:11434".to_string(),
                model: "all-minilm".to_string(),
                api_key: None,
            },
            reranker: RerankerConfig {
                endpoint: "http://localhost:8421".to_string(),
                enabled: false,
            },
            llm: LlmConfig {
                llm_endpoint: "http://localhost:11434".to_string(),
                llm_key: "ollama".to_string(),
                llm_model: "gemma3:27b".to_string(),
                max_tokens: 1024,
                enabled: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [logging]
            level = "debug"
            backtrace = false

            [retrieval]
            index_path = "data/test.index.json"
            catalog_path = "data/test.tsv"

            [embeddings]
            provider = "ollama"
            endpoint = "http://localhost:11434"
            model = "all-minilm"

            [reranker]
            endpoint = "http://localhost:8421"
            enabled = true

            [llm]
            llm_endpoint = "http://localhost:11434"
            llm_key = "ollama"
        "#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.top_k(), 50);
        assert_eq!(config.rerank_top(), 5);
        assert_eq!(config.max_context_chars(), 3500);
        assert!(config.reranker_enabled());
        assert!(!config.llm_enabled());
        assert_eq!(config.llm_model(), "gemma3:27b");
    }
}
