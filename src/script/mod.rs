//! Interface update script: mutate a batch of interfaces, cross-reference the
//! change log, and report a rerun link plus a configuration preview.

pub mod changelog;
mod error;
mod log;
pub mod mutator;
pub mod render;
pub mod rerun;
pub mod source;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{ChangeEntry, InterfaceMode, InterfaceRecord, ObjectRef, ParameterSet, Vlan};

pub use error::ScriptError;
pub use log::{LogLine, ScriptLog};
#[cfg(test)]
pub use log::LogLevel;
pub use mutator::InterfaceUpdate;
pub use source::ScriptRequest;

/// Persistence operations the script needs for interface records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Capture the record's persisted state as its pre-change image. Best effort.
    async fn snapshot(&self, _record: &mut InterfaceRecord) -> Result<(), ScriptError> {
        Ok(())
    }

    async fn validate(&self, record: &InterfaceRecord) -> Result<(), ScriptError>;

    /// Save description, mode and untagged VLAN, recording the change under `batch_token`
    async fn save(&self, record: &mut InterfaceRecord, batch_token: &Uuid) -> Result<(), ScriptError>;

    /// Replace the record's tagged VLAN membership with `record.tagged_vlans`
    async fn set_tagged_vlans(&self, record: &InterfaceRecord, batch_token: &Uuid) -> Result<(), ScriptError>;
}

/// Read side of the change log
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn find(
        &self,
        batch_token: &str,
        object_type: &str,
        object_id: i64,
    ) -> Result<Option<ChangeEntry>, ScriptError>;

    fn locator(&self, entry: &ChangeEntry) -> String;
}

/// What to do with the rest of the batch when an interface fails to save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    FailFast,
    Continue,
}

impl FailurePolicy {
    pub fn from_fail_fast(fail_fast: bool) -> Self {
        if fail_fast {
            Self::FailFast
        } else {
            Self::Continue
        }
    }
}

/// Per-run context: the batch token, the path the script was invoked on,
/// and whether changes are committed
#[derive(Debug, Clone)]
pub struct RunContext {
    pub batch_token: Uuid,
    pub base_path: String,
    pub commit: bool,
    pub policy: FailurePolicy,
}

impl RunContext {
    pub fn new(base_path: impl Into<String>, commit: bool, policy: FailurePolicy) -> Self {
        Self {
            batch_token: Uuid::new_v4(),
            base_path: base_path.into(),
            commit,
            policy,
        }
    }

    #[cfg(test)]
    pub fn preview(base_path: &str) -> Self {
        Self::new(base_path, false, FailurePolicy::FailFast)
    }

    #[cfg(test)]
    pub fn committing(base_path: &str) -> Self {
        Self::new(base_path, true, FailurePolicy::FailFast)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceFailure {
    pub interface: String,
    pub error: String,
}

/// Per-interface result of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub updated: Vec<String>,
    pub failures: Vec<InterfaceFailure>,
    pub skipped: Vec<String>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything a run produces for the operator
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRun {
    pub request_id: Uuid,
    pub commit: bool,
    pub log: Vec<LogLine>,
    pub rerun_link: String,
    pub rendered_config: String,
    pub outcome: BatchOutcome,
}

/// Narrow the parameter set to the field changes shared by every interface
pub fn interface_update(params: &ParameterSet) -> InterfaceUpdate {
    let vlan = |obj: &ObjectRef| match obj {
        ObjectRef::Vlan(v) => Some(v.clone()),
        _ => None,
    };

    InterfaceUpdate {
        description: params.text("interface_description").to_string(),
        mode: InterfaceMode::from_choice(params.text("mode")),
        untagged_vlan: params.object("untagged_vlan").and_then(vlan),
        tagged_vlans: distinct_vlans(params.objects("tagged_vlans").iter().filter_map(vlan)),
    }
}

/// Tagged VLANs form a set; keep the first occurrence of each id
fn distinct_vlans(vlans: impl Iterator<Item = Vlan>) -> Vec<Vlan> {
    let mut seen = HashSet::new();
    vlans.filter(|v| seen.insert(v.id)).collect()
}

fn selected_interfaces(params: &ParameterSet) -> Vec<InterfaceRecord> {
    params
        .objects("interfaces")
        .iter()
        .filter_map(|obj| match obj {
            ObjectRef::Interface(i) => Some(i.clone()),
            _ => None,
        })
        .collect()
}

/// Run the interface update script.
///
/// Interfaces are updated one at a time; the change log is then consulted
/// for every interface that was attempted, and finally the rerun link and
/// the configuration preview are logged. Only a rendering fault is returned
/// as an error; save failures are reported through the outcome and the log.
pub async fn run(
    params: &ParameterSet,
    ctx: &RunContext,
    store: &dyn RecordStore,
    audit: &dyn AuditLog,
) -> Result<ScriptRun> {
    let update = interface_update(params);
    let mut log = ScriptLog::new();
    let mut outcome = BatchOutcome::default();
    let mut attempted: Vec<InterfaceRecord> = Vec::new();

    tracing::info!(
        request_id = %ctx.batch_token,
        commit = ctx.commit,
        "Running interface update"
    );

    let mut pending = selected_interfaces(params).into_iter();
    while let Some(mut record) = pending.next() {
        match mutator::apply(&mut record, &update, ctx, store, &mut log).await {
            Ok(()) => outcome.updated.push(record.name.clone()),
            Err(e) => {
                outcome.failures.push(InterfaceFailure {
                    interface: record.name.clone(),
                    error: e.to_string(),
                });
                if e.is_fatal() && ctx.policy == FailurePolicy::FailFast {
                    attempted.push(record);
                    outcome.skipped = pending.by_ref().map(|r| r.name).collect();
                    break;
                }
            }
        }
        attempted.push(record);
    }

    if !outcome.skipped.is_empty() {
        log.warning(format!(
            "Stopped after the first failure; skipped interfaces: {}",
            outcome.skipped.join(", ")
        ));
    }

    for record in &attempted {
        changelog::correlate(record, ctx, audit, &mut log).await;
    }

    let link = rerun::rerun_link(&ctx.base_path, params);
    log.info(format!("[CLICK HERE TO RUN AGAIN]({})", link));

    let rendered = render::render_interface_config(&attempted)?;
    log.info(format!("Generated Interface Configuration:\n{}", rendered));

    Ok(ScriptRun {
        request_id: ctx.batch_token,
        commit: ctx.commit,
        log: log.into_lines(),
        rerun_link: link,
        rendered_config: rendered,
        outcome,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::models::Vlan;

    pub fn vlan(id: i64, vid: i32) -> Vlan {
        Vlan { id, vid, name: format!("v{}", vid), group_id: None, site_id: None }
    }

    pub fn interface(id: i64, name: &str) -> InterfaceRecord {
        InterfaceRecord {
            id: Some(id),
            device_id: 1,
            device_name: "sw1".into(),
            site_id: Some(1),
            name: name.into(),
            description: String::new(),
            mode: None,
            untagged_vlan: None,
            tagged_vlans: Vec::new(),
            updated_at: None,
            prechange: None,
        }
    }

    /// In-memory record store counting calls; rejects validation for listed interfaces
    #[derive(Default)]
    pub struct FakeStore {
        reject: HashSet<String>,
        calls: Mutex<Calls>,
    }

    #[derive(Default)]
    struct Calls {
        snapshot: usize,
        validate: usize,
        tagged: usize,
        saved: Vec<InterfaceRecord>,
    }

    impl FakeStore {
        pub fn rejecting(name: &str) -> Self {
            Self {
                reject: HashSet::from([name.to_string()]),
                ..Default::default()
            }
        }

        pub fn snapshot_calls(&self) -> usize {
            self.calls.lock().unwrap().snapshot
        }

        pub fn validate_calls(&self) -> usize {
            self.calls.lock().unwrap().validate
        }

        pub fn save_calls(&self) -> usize {
            self.calls.lock().unwrap().saved.len()
        }

        pub fn tagged_calls(&self) -> usize {
            self.calls.lock().unwrap().tagged
        }

        pub fn saved(&self) -> Vec<InterfaceRecord> {
            self.calls.lock().unwrap().saved.clone()
        }
    }

    #[async_trait]
    impl RecordStore for FakeStore {
        async fn snapshot(&self, _record: &mut InterfaceRecord) -> Result<(), ScriptError> {
            self.calls.lock().unwrap().snapshot += 1;
            Ok(())
        }

        async fn validate(&self, record: &InterfaceRecord) -> Result<(), ScriptError> {
            self.calls.lock().unwrap().validate += 1;
            if self.reject.contains(&record.name) {
                return Err(ScriptError::validation("description", "rejected by test"));
            }
            Ok(())
        }

        async fn save(&self, record: &mut InterfaceRecord, _batch_token: &Uuid) -> Result<(), ScriptError> {
            self.calls.lock().unwrap().saved.push(record.clone());
            Ok(())
        }

        async fn set_tagged_vlans(&self, _record: &InterfaceRecord, _batch_token: &Uuid) -> Result<(), ScriptError> {
            self.calls.lock().unwrap().tagged += 1;
            Ok(())
        }
    }

    /// Change log holding at most one entry, or failing every lookup
    #[derive(Default)]
    pub struct FakeAudit {
        entry: Option<ChangeEntry>,
        fault: Option<String>,
    }

    impl FakeAudit {
        pub fn with_entry(request_id: &str, object_id: i64, entry_id: i64) -> Self {
            Self {
                entry: Some(ChangeEntry {
                    id: entry_id,
                    request_id: request_id.to_string(),
                    action: crate::models::change_action::UPDATE.to_string(),
                    changed_object_type: crate::models::INTERFACE_OBJECT_TYPE.to_string(),
                    changed_object_id: object_id,
                    object_repr: String::new(),
                    prechange_data: None,
                    postchange_data: None,
                    time: chrono::Utc::now(),
                }),
                fault: None,
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                entry: None,
                fault: Some(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl AuditLog for FakeAudit {
        async fn find(
            &self,
            batch_token: &str,
            object_type: &str,
            object_id: i64,
        ) -> Result<Option<ChangeEntry>, ScriptError> {
            if let Some(fault) = &self.fault {
                return Err(ScriptError::AuditLookup(fault.clone()));
            }
            Ok(self.entry.clone().filter(|e| {
                e.request_id == batch_token
                    && e.changed_object_type == object_type
                    && e.changed_object_id == object_id
            }))
        }

        fn locator(&self, entry: &ChangeEntry) -> String {
            format!("/api/changelog/{}", entry.id)
        }
    }
}
