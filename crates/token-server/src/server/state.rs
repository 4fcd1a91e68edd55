//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::ServiceIdentity;
use crate::signer::TokenSigner;

/// Application state shared across all request handlers.
///
/// All fields are `Arc`-backed or `Copy`, so Axum's per-request clone is cheap.
/// Nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application id and certificate used for every token.
    pub identity: Arc<ServiceIdentity>,
    /// Signing backend.
    pub signer: Arc<dyn TokenSigner>,
    /// Validity window applied when a request carries no `expiry`.
    pub token_expiry_secs: u32,
}

impl AppState {
    pub fn new(
        identity: ServiceIdentity,
        signer: Arc<dyn TokenSigner>,
        token_expiry_secs: u32,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            signer,
            token_expiry_secs,
        }
    }
}

#[cfg(test)]
impl Default for AppState {
    /// Real signer with a fixed test identity.
    fn default() -> Self {
        Self::new(
            ServiceIdentity::new(
                "970CA35de60c44645bbae8a215061b33",
                "5CFd2fd1755d40ecb72977518be15d3b",
            ),
            Arc::new(crate::signer::AccessTokenSigner),
            3600,
        )
    }
}
