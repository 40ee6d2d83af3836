// src/sheets/client.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::Mutex;

use super::SheetSource;
use crate::clock::Clock;
use crate::error::LoadError;

/// Builds an authenticated handle to the remote source.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn SheetSource>, LoadError>;
}

/// Memoizes one authenticated handle for `validity`, shared by all loaders.
///
/// Failed connections are not remembered; the next call retries.
pub struct ClientProvider {
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    validity: Duration,
    slot: Mutex<Option<(Arc<dyn SheetSource>, Instant)>>,
}

impl ClientProvider {
    pub fn new(connector: Arc<dyn Connector>, clock: Arc<dyn Clock>, validity: Duration) -> Self {
        Self {
            connector,
            clock,
            validity,
            slot: Mutex::new(None),
        }
    }

    pub async fn get_client(&self) -> Result<Arc<dyn SheetSource>, LoadError> {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();
        if let Some((client, created)) = slot.as_ref() {
            if now.saturating_duration_since(*created) < self.validity {
                return Ok(Arc::clone(client));
            }
        }

        match self.connector.connect().await {
            Ok(client) => {
                tracing::info!(source = client.name(), "sheets client connected");
                *slot = Some((Arc::clone(&client), now));
                Ok(client)
            }
            Err(e) => {
                *slot = None;
                counter!("dashboard_auth_errors_total").increment(1);
                tracing::error!(error = %e, "cannot connect to sheets");
                Err(e)
            }
        }
    }

    /// Drop the memoized handle, e.g. after the remote rejected its token.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    /// Fetch one sheet through the shared client.
    ///
    /// An auth failure during the fetch drops the handle so the next cycle
    /// reconnects.
    pub async fn fetch_grid(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
    ) -> Result<Vec<Vec<String>>, LoadError> {
        let client = self.get_client().await?;
        let res = client.fetch_values(spreadsheet_id, sheet).await;
        if let Err(LoadError::Auth { .. }) = &res {
            self.invalidate().await;
        }
        res
    }
}
