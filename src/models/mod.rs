use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod params;

pub use params::{ObjectRef, ParamValue, ParameterSet};

/// Canonical interface mode values, spelled the way NetBox stores them
pub mod interface_mode {
    pub const ACCESS: &str = "access";
    pub const TAGGED: &str = "tagged";
    pub const TAGGED_ALL: &str = "tagged-all";
    pub const Q_IN_Q: &str = "q-in-q";

    pub const ALL: &[&str] = &[ACCESS, TAGGED, TAGGED_ALL, Q_IN_Q];
}

/// 802.1Q switching mode of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceMode {
    #[serde(rename = "access")]
    Access,
    #[serde(rename = "tagged")]
    Tagged,
    #[serde(rename = "tagged-all")]
    TaggedAll,
    #[serde(rename = "q-in-q")]
    QInQ,
}

impl InterfaceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => interface_mode::ACCESS,
            Self::Tagged => interface_mode::TAGGED,
            Self::TaggedAll => interface_mode::TAGGED_ALL,
            Self::QInQ => interface_mode::Q_IN_Q,
        }
    }

    /// Parse a mode choice value; returns None for anything outside the choice set
    pub fn from_choice(value: &str) -> Option<Self> {
        match value {
            interface_mode::ACCESS => Some(Self::Access),
            interface_mode::TAGGED => Some(Self::Tagged),
            interface_mode::TAGGED_ALL => Some(Self::TaggedAll),
            interface_mode::Q_IN_Q => Some(Self::QInQ),
            _ => None,
        }
    }
}

impl fmt::Display for InterfaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site scopes devices, VLAN groups and VLANs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Device owning a set of interfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// VlanGroup is the picker scope for VLANs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanGroup {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
}

/// VLAN referenced by interface untagged/tagged assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: i64,
    pub vid: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    /// None means the VLAN is global
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
}

impl fmt::Display for Vlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.vid)
    }
}

/// Content type under which interface changes are recorded in the change log
pub const INTERFACE_OBJECT_TYPE: &str = "dcim.interface";

/// InterfaceRecord is a device interface together with its VLAN assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub id: Option<i64>,
    pub device_id: i64,
    pub device_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mode: Option<InterfaceMode>,
    #[serde(default)]
    pub untagged_vlan: Option<Vlan>,
    #[serde(default)]
    pub tagged_vlans: Vec<Vlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Pre-change image captured for the change log before the first mutation
    #[serde(skip)]
    pub prechange: Option<serde_json::Value>,
}

impl InterfaceRecord {
    /// Post-change image written to the change log
    pub fn change_image(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "device": self.device_id,
            "description": self.description,
            "mode": self.mode.map(|m| m.as_str()),
            "untagged_vlan": self.untagged_vlan.as_ref().map(|v| v.id),
            "tagged_vlans": self.tagged_vlans.iter().map(|v| v.id).collect::<Vec<_>>(),
        })
    }
}

impl fmt::Display for InterfaceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Canonical change log actions
pub mod change_action {
    pub const UPDATE: &str = "update";
}

/// ChangeEntry is one change log row produced by a save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub id: i64,
    pub request_id: String,
    pub action: String,
    pub changed_object_type: String,
    pub changed_object_id: i64,
    pub object_repr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prechange_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postchange_data: Option<serde_json::Value>,
    pub time: DateTime<Utc>,
}

/// Query for the change log listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeLogQuery {
    pub request_id: String,
}

/// Query for VLAN and VLAN group pickers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VlanScopeQuery {
    #[serde(default)]
    pub site_id: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
}
