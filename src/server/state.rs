use std::path::Path;
use std::sync::Arc;

use crate::config::ResolvedConfig;
use crate::library::ScanOptions;

/// Shared, read-only server state
pub struct AppState {
    pub config: ResolvedConfig,
    pub scan_options: ScanOptions,
}

impl AppState {
    pub fn new(config: ResolvedConfig) -> Arc<Self> {
        let scan_options = config.scan_options();
        Arc::new(Self {
            config,
            scan_options,
        })
    }

    pub fn content_root(&self) -> &Path {
        &self.config.content_root
    }
}
