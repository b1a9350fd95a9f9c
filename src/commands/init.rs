//! Development store initialization.

use promptdesk_core::config::AppConfig;
use promptdesk_core::result::AppResult;
use promptdesk_core::types::OperationOutcome;
use promptdesk_database::StoreHandle;

use crate::output;

/// Create the store file and install the fixture schema when it is empty.
pub async fn execute(config: &AppConfig) -> AppResult<bool> {
    let outcome = match StoreHandle::initialize(&config.database).await {
        Ok((store, report)) => {
            let message = format!(
                "Store '{}' ready at schema version {}",
                store.path().display(),
                report.version
            );
            store.close().await;
            OperationOutcome::success(None, message).with_data(&report)
        }
        Err(e) => OperationOutcome::from_error(&e),
    };
    Ok(output::print_outcome(&outcome))
}
