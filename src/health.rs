use tracing::{error, info};

use crate::import::ImportError;
use crate::repositories::PostStore;

/// Verify storage is reachable before any document is touched.
pub async fn check_storage(store: &dyn PostStore) -> Result<(), ImportError> {
    match store.ping().await {
        Ok(()) => {
            info!("Storage health check passed");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "Storage health check failed");
            Err(ImportError::FatalSetup(format!(
                "storage unreachable: {err:#}"
            )))
        }
    }
}
