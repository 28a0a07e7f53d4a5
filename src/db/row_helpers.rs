use sqlx::{Row, sqlite::SqliteRow};

use crate::models::*;

/// Parse a JSON text column, treating NULL or malformed data as absent
pub fn json_column(opt: Option<String>) -> Option<serde_json::Value> {
    opt.and_then(|s| serde_json::from_str(&s).ok())
}

/// Map a SQLite row to a Site struct
pub fn map_site_row(row: &SqliteRow) -> Site {
    Site {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
    }
}

/// Map a SQLite row to a Device struct
pub fn map_device_row(row: &SqliteRow) -> Device {
    Device {
        id: row.get("id"),
        name: row.get("name"),
        site_id: row.try_get::<Option<i64>, _>("site_id").ok().flatten(),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a SQLite row to a VlanGroup struct
pub fn map_vlan_group_row(row: &SqliteRow) -> VlanGroup {
    VlanGroup {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        site_id: row.try_get::<Option<i64>, _>("site_id").ok().flatten(),
    }
}

/// Map a SQLite row to a Vlan struct
pub fn map_vlan_row(row: &SqliteRow) -> Vlan {
    Vlan {
        id: row.get("id"),
        vid: row.get("vid"),
        name: row.get("name"),
        group_id: row.try_get::<Option<i64>, _>("group_id").ok().flatten(),
        site_id: row.try_get::<Option<i64>, _>("site_id").ok().flatten(),
    }
}

/// Map the untagged VLAN columns (`uv_*`) of an interface row, if one is assigned
pub fn map_untagged_vlan(row: &SqliteRow) -> Option<Vlan> {
    let id: Option<i64> = row.try_get("uv_id").ok().flatten();
    id.map(|id| Vlan {
        id,
        vid: row.get("uv_vid"),
        name: row.get("uv_name"),
        group_id: row.try_get::<Option<i64>, _>("uv_group_id").ok().flatten(),
        site_id: row.try_get::<Option<i64>, _>("uv_site_id").ok().flatten(),
    })
}

/// Map a SQLite row to an InterfaceRecord without its tagged VLANs
pub fn map_interface_row(row: &SqliteRow) -> InterfaceRecord {
    let mode: String = row.get("mode");
    InterfaceRecord {
        id: Some(row.get("id")),
        device_id: row.get("device_id"),
        device_name: row.get("device_name"),
        site_id: row.try_get::<Option<i64>, _>("site_id").ok().flatten(),
        name: row.get("name"),
        description: row.get("description"),
        mode: InterfaceMode::from_choice(&mode),
        untagged_vlan: map_untagged_vlan(row),
        tagged_vlans: Vec::new(),
        updated_at: row.get("updated_at"),
        prechange: None,
    }
}

/// Map a SQLite row to a ChangeEntry struct
pub fn map_change_row(row: &SqliteRow) -> ChangeEntry {
    ChangeEntry {
        id: row.get("id"),
        request_id: row.get("request_id"),
        action: row.get("action"),
        changed_object_type: row.get("changed_object_type"),
        changed_object_id: row.get("changed_object_id"),
        object_repr: row.get("object_repr"),
        prechange_data: json_column(row.get("prechange_data")),
        postchange_data: json_column(row.get("postchange_data")),
        time: row.get("time"),
    }
}
