use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::*;
use crate::script::{AuditLog, RecordStore, ScriptError};

use super::changelog::{ChangeRecord, ChangeRepo};
use super::interfaces::InterfaceRepo;
use super::vlans::VlanRepo;
use super::Store;

/// Longest description an interface accepts
pub const DESCRIPTION_MAX_LEN: usize = 200;

/// Check an interface description against its column constraints
pub fn validate_description(description: &str) -> Result<(), ScriptError> {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(ScriptError::validation(
            "description",
            format!("Ensure this value has at most {} characters.", DESCRIPTION_MAX_LEN),
        ));
    }
    if description.chars().any(char::is_control) {
        return Err(ScriptError::validation(
            "description",
            "Control characters are not allowed.",
        ));
    }
    Ok(())
}

impl Store {
    async fn check_vlan(&self, field: &str, vlan: &Vlan) -> Result<(), ScriptError> {
        if !(1..=4094).contains(&vlan.vid) {
            return Err(ScriptError::validation(
                field,
                format!("VLAN {} has an invalid VLAN ID (must be 1-4094).", vlan),
            ));
        }
        let stored = VlanRepo::get(&self.pool, vlan.id)
            .await
            .map_err(|e| ScriptError::persistence(vlan, e))?;
        if stored.is_none() {
            return Err(ScriptError::validation(
                field,
                format!("VLAN {} does not exist.", vlan),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for Store {
    async fn snapshot(&self, record: &mut InterfaceRecord) -> Result<(), ScriptError> {
        let Some(id) = record.id else {
            return Ok(());
        };
        if record.prechange.is_some() {
            return Ok(());
        }
        let persisted = InterfaceRepo::get(&self.pool, id)
            .await
            .map_err(|e| ScriptError::persistence(&*record, e))?;
        record.prechange = persisted.map(|p| p.change_image());
        Ok(())
    }

    async fn validate(&self, record: &InterfaceRecord) -> Result<(), ScriptError> {
        validate_description(&record.description)?;

        if let Some(vlan) = &record.untagged_vlan {
            self.check_vlan("untagged_vlan", vlan).await?;
            if vlan.site_id.is_some() && vlan.site_id != record.site_id {
                return Err(ScriptError::validation(
                    "untagged_vlan",
                    format!(
                        "The untagged VLAN ({}) must belong to the same site as the interface's parent device, or it must be global.",
                        vlan
                    ),
                ));
            }
        }

        for vlan in &record.tagged_vlans {
            self.check_vlan("tagged_vlans", vlan).await?;
        }
        Ok(())
    }

    async fn save(&self, record: &mut InterfaceRecord, batch_token: &Uuid) -> Result<(), ScriptError> {
        let name = record.name.clone();
        let fail = |e: anyhow::Error| ScriptError::persistence(&name, e);

        let id = record
            .id
            .ok_or_else(|| ScriptError::persistence(&name, "interface has no primary key"))?;
        let now = Utc::now();
        let request_id = batch_token.to_string();
        let postchange = record.change_image();

        let mut tx = self.pool.begin().await.map_err(|e| fail(e.into()))?;
        InterfaceRepo::update_fields(&mut *tx, id, record, now).await.map_err(fail)?;
        ChangeRepo::record(
            &mut *tx,
            &ChangeRecord {
                request_id: &request_id,
                object_type: INTERFACE_OBJECT_TYPE,
                object_id: id,
                object_repr: &name,
                prechange: record.prechange.as_ref(),
                postchange: &postchange,
                time: now,
            },
        )
        .await
        .map_err(fail)?;
        tx.commit().await.map_err(|e| fail(e.into()))?;

        record.updated_at = Some(now);
        tracing::debug!(request_id = %request_id, "Saved interface {} ({})", name, id);
        Ok(())
    }

    async fn set_tagged_vlans(&self, record: &InterfaceRecord, batch_token: &Uuid) -> Result<(), ScriptError> {
        let fail = |e: anyhow::Error| ScriptError::persistence(record, e);

        let id = record
            .id
            .ok_or_else(|| ScriptError::persistence(record, "interface has no primary key"))?;
        for vlan in &record.tagged_vlans {
            self.check_vlan("tagged_vlans", vlan).await?;
        }
        let now = Utc::now();
        let request_id = batch_token.to_string();
        let vlan_ids: Vec<i64> = record.tagged_vlans.iter().map(|v| v.id).collect();
        let postchange = record.change_image();

        let mut tx = self.pool.begin().await.map_err(|e| fail(e.into()))?;
        InterfaceRepo::replace_tagged(&mut *tx, id, &vlan_ids, now).await.map_err(fail)?;
        ChangeRepo::record(
            &mut *tx,
            &ChangeRecord {
                request_id: &request_id,
                object_type: INTERFACE_OBJECT_TYPE,
                object_id: id,
                object_repr: &record.name,
                prechange: record.prechange.as_ref(),
                postchange: &postchange,
                time: now,
            },
        )
        .await
        .map_err(fail)?;
        tx.commit().await.map_err(|e| fail(e.into()))?;
        Ok(())
    }
}

#[async_trait]
impl AuditLog for Store {
    async fn find(
        &self,
        batch_token: &str,
        object_type: &str,
        object_id: i64,
    ) -> Result<Option<ChangeEntry>, ScriptError> {
        ChangeRepo::find_latest(&self.pool, batch_token, object_type, object_id)
            .await
            .map_err(|e| ScriptError::AuditLookup(e.to_string()))
    }

    fn locator(&self, entry: &ChangeEntry) -> String {
        format!("{}/api/changelog/{}", self.public_url, entry.id)
    }
}
