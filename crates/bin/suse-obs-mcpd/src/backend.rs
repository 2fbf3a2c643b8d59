use std::sync::Arc;

use suse_obs_core::backend::{BackendResult, HttpBackend, HttpBackendConfig};
use tracing::debug;

use crate::config::ObsConfig;

/// Builds the shared HTTP backend from the daemon configuration.
pub fn build_backend(config: &ObsConfig) -> BackendResult<Arc<HttpBackend>> {
    let backend_config = HttpBackendConfig::new(config.url.clone(), config.token.clone())
        .with_token_kind(config.token_kind)
        .with_timeout(config.request_timeout);
    debug!(url = %config.url, token_kind = ?config.token_kind, "configuring backend");
    HttpBackend::new(backend_config).map(Arc::new)
}
