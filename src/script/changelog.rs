use crate::models::{InterfaceRecord, INTERFACE_OBJECT_TYPE};

use super::{AuditLog, RunContext, ScriptLog};

/// Result of looking up the change log entry a batch produced for one interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    Found { locator: String },
    NotFound,
    Fault(String),
}

/// Find the change log entry for `record` under the run's batch token and log it.
///
/// Never fails: a missing entry or a lookup error becomes an informational line.
pub async fn correlate(
    record: &InterfaceRecord,
    ctx: &RunContext,
    audit: &dyn AuditLog,
    log: &mut ScriptLog,
) -> Correlation {
    let token = ctx.batch_token.to_string();

    let lookup = match record.id {
        Some(id) => audit.find(&token, INTERFACE_OBJECT_TYPE, id).await,
        None => Ok(None),
    };

    match lookup {
        Ok(Some(entry)) => {
            let locator = audit.locator(&entry);
            log.info(format!(
                "Change Log for Interface '{}': Request ID [{}]({})",
                record, token, locator
            ));
            Correlation::Found { locator }
        }
        Ok(None) => {
            log.info(format!(
                "Change Log for Interface '{}': Request ID {} (No change log entry found.)",
                record, token
            ));
            Correlation::NotFound
        }
        Err(e) => {
            log.info(format!(
                "An error occurred while retrieving the change log entry for interface '{}': {}",
                record, e
            ));
            Correlation::Fault(e.to_string())
        }
    }
}
