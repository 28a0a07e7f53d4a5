use crate::models::{InterfaceMode, InterfaceRecord, Vlan};

use super::{RecordStore, RunContext, ScriptError, ScriptLog};

/// Field changes requested for every interface in a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceUpdate {
    pub description: String,
    pub mode: Option<InterfaceMode>,
    pub untagged_vlan: Option<Vlan>,
    pub tagged_vlans: Vec<Vlan>,
}

/// Apply an update to one interface.
///
/// Steps run in a fixed order: description, mode, untagged VLAN, then
/// validate + save when committing, then the tagged VLAN set. A validation
/// or save failure is logged and returned; the fields changed before it
/// stay changed on the in-memory record.
pub async fn apply(
    record: &mut InterfaceRecord,
    update: &InterfaceUpdate,
    ctx: &RunContext,
    store: &dyn RecordStore,
    log: &mut ScriptLog,
) -> Result<(), ScriptError> {
    if record.id.is_some() {
        if let Err(e) = store.snapshot(record).await {
            tracing::warn!("Could not snapshot interface {}: {}", record, e);
        }
    }

    if !update.description.is_empty() {
        record.description = update.description.clone();
        log.success(format!(
            "Updated description for interface '{}': {}",
            record, update.description
        ));
    } else {
        log.info(format!(
            "Description field was left blank for interface '{}' and was not modified.",
            record
        ));
    }

    if let Some(mode) = update.mode {
        record.mode = Some(mode);
        log.success(format!("Updated mode for interface '{}' to: {}", record, mode));
    }

    if let Some(vlan) = &update.untagged_vlan {
        record.untagged_vlan = Some(vlan.clone());
        log.success(format!(
            "Assigned untagged VLAN for interface '{}': {}",
            record, vlan
        ));
    }

    if ctx.commit {
        if let Err(e) = save(record, ctx, store).await {
            log.failure(format!("Interface '{}' was not updated: {}", record, e));
            return Err(e);
        }
        log.success(format!("Interface '{}' updated successfully.", record));
    }

    if !update.tagged_vlans.is_empty() {
        record.tagged_vlans = update.tagged_vlans.clone();
        if ctx.commit {
            if let Err(e) = store.set_tagged_vlans(record, &ctx.batch_token).await {
                log.failure(format!(
                    "Tagged VLANs for interface '{}' were not saved: {}",
                    record, e
                ));
                return Err(e);
            }
        }
        let names: Vec<String> = record.tagged_vlans.iter().map(|v| v.to_string()).collect();
        log.success(format!(
            "Assigned tagged VLANs for interface '{}': {}",
            record,
            names.join(", ")
        ));
    }

    Ok(())
}

async fn save(
    record: &mut InterfaceRecord,
    ctx: &RunContext,
    store: &dyn RecordStore,
) -> Result<(), ScriptError> {
    store.validate(record).await?;
    store.save(record, &ctx.batch_token).await
}
