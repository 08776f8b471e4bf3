use std::sync::Arc;

use axum::http::HeaderMap;
use notary_service::NotarizationService;
use tracing::debug;

use crate::auth::{Action, AuthProvider, Credentials, Identity, TrustedHeaderAuth};
use crate::config::ServerConfig;
use crate::content::ContentStore;
use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NotarizationService>,
    pub content: Arc<ContentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Open every backend named by `config`.
    pub fn open(config: &ServerConfig) -> ServerResult<Self> {
        let service = config.open_service()?;
        let content = ContentStore::open(config.content_dir())?;
        Ok(Self {
            service: Arc::new(service),
            content: Arc::new(content),
            auth: Arc::new(TrustedHeaderAuth {
                allow_anonymous_verify: config.allow_anonymous_verify,
            }),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// Authenticate the caller and check it may perform `action`.
    pub async fn authorize(&self, headers: &HeaderMap, action: Action) -> ServerResult<Identity> {
        let credentials = Credentials::from_headers(headers)?;
        let identity = self.auth.authenticate(&credentials).await?;
        if !self.auth.authorize(&identity, action).await? {
            debug!(actor = %identity.name, %action, "request denied");
            return Err(ServerError::AuthorizationDenied {
                actor: identity.name,
                action: action.to_string(),
            });
        }
        Ok(identity)
    }

    /// Run synchronous service work off the async executor.
    pub async fn blocking<T, F>(&self, work: F) -> ServerResult<T>
    where
        F: FnOnce(&NotarizationService, &ContentStore) -> ServerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let content = Arc::clone(&self.content);
        tokio::task::spawn_blocking(move || work(&service, &content))
            .await
            .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("content", &self.content.root())
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}
