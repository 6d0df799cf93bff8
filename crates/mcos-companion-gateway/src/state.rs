use std::sync::Arc;

use mcos_companion_core::{
    default_store_items, Catalog, CatalogError, ChatError, CompanionConfig, GeminiClient,
    IconDirectory, ProcessLauncher, ShellLauncher, StoreItem, TextGenerator,
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("chat client: {0}")]
    Chat(#[from] ChatError),
}

/// Read-only state shared by every request. Built once in `main`.
pub struct AppState {
    pub config: Arc<CompanionConfig>,
    pub catalog: Catalog,
    pub icons: IconDirectory,
    pub store_items: Vec<StoreItem>,
    pub launcher: Arc<dyn ProcessLauncher>,
    /// `None` when no usable Gemini key is configured; `/chat` then answers 503.
    pub chat: Option<Arc<dyn TextGenerator>>,
}

impl AppState {
    pub fn from_config(
        config: CompanionConfig,
        gemini_api_key: Option<String>,
    ) -> Result<Self, StartupError> {
        let catalog = config.catalog()?;
        let chat: Option<Arc<dyn TextGenerator>> = match gemini_api_key {
            Some(key) => {
                let client: Arc<dyn TextGenerator> = Arc::new(
                    GeminiClient::new(key, config.chat_timeout())?
                        .with_api_base(&config.gemini_api_base)
                        .with_model(&config.gemini_model),
                );
                Some(client)
            }
            None => None,
        };
        Ok(Self {
            icons: IconDirectory::new(config.icons_dir.clone()),
            catalog,
            store_items: default_store_items(),
            launcher: Arc::new(ShellLauncher::new()),
            chat,
            config: Arc::new(config),
        })
    }
}
