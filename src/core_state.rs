//! Transport-agnostic application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc`, and shared by
//! every request handler. Connections are opened per operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigError, LlmProvider, Settings};
use crate::db;
use crate::pipeline::analysis::{
    AnalysisError, GeminiClient, LlmClient, OllamaClient, SymptomAnalyzer,
};

pub struct CoreState {
    /// SQLite database file.
    db_path: PathBuf,
    analyzer: Arc<SymptomAnalyzer>,
}

impl CoreState {
    pub fn new(db_path: PathBuf, analyzer: SymptomAnalyzer) -> Self {
        Self {
            db_path,
            analyzer: Arc::new(analyzer),
        }
    }

    /// Build state from settings: pick the upstream client and make sure
    /// the database exists and is migrated.
    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        let llm: Box<dyn LlmClient + Send + Sync> = match settings.provider {
            LlmProvider::Gemini => {
                let key = settings
                    .gemini_api_key
                    .as_deref()
                    .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
                Box::new(GeminiClient::new(
                    &settings.gemini_base_url,
                    key,
                    settings.llm_timeout_secs,
                )?)
            }
            LlmProvider::Ollama => Box::new(OllamaClient::new(
                &settings.ollama_url,
                settings.llm_timeout_secs,
            )?),
        };

        let analyzer = SymptomAnalyzer::new(llm, &settings.model)
            .with_failure_sentinel(settings.failure_sentinel);

        // Run migrations up front so the first request does not pay for them.
        db::open_database(&settings.db_path)?;

        tracing::info!(
            provider = ?settings.provider,
            model = %settings.model,
            db_path = %settings.db_path.display(),
            "Core state initialized"
        );

        Ok(Self::new(settings.db_path.clone(), analyzer))
    }

    /// Open a database connection.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Shared handle to the analyzer, for use on blocking threads.
    pub fn analyzer(&self) -> Arc<SymptomAnalyzer> {
        Arc::clone(&self.analyzer)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Analysis client error: {0}")]
    Analysis(#[from] AnalysisError),
}
