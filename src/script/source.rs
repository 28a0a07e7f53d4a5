use serde::Serialize;

use crate::db::Store;
use crate::models::{interface_mode, InterfaceMode, ObjectRef, ParamValue, ParameterSet};

use super::{rerun, FailurePolicy, ScriptError};

/// Script fields in declaration order
pub const SCRIPT_FIELDS: &[&str] = &[
    "site",
    "device",
    "interfaces",
    "interface_description",
    "mode",
    "vlan_group",
    "untagged_vlan",
    "tagged_vlans",
];

/// Decoded script invocation
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRequest {
    pub params: ParameterSet,
    pub commit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<FailurePolicy>,
}

/// Raw query pairs with lookups by field name
struct RawParams(Vec<(String, String)>);

impl RawParams {
    /// Last value given for a field, like a form submission
    fn last(&self, name: &str) -> Option<&str> {
        self.0.iter().rev().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn all(&self, name: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == name).map(|(_, v)| v.as_str()).collect()
    }
}

fn parse_id(field: &str, value: &str) -> Result<i64, ScriptError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ScriptError::parameter(field, format!("'{}' is not a valid object id", value)))
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "on" | "yes")
    )
}

fn lookup_failed(field: &str, e: anyhow::Error) -> ScriptError {
    ScriptError::parameter(field, format!("lookup failed: {}", e))
}

fn missing(field: &str, id: i64) -> ScriptError {
    ScriptError::parameter(field, format!("no object with id {}", id))
}

async fn resolve_object(store: &Store, field: &str, id: i64) -> Result<ObjectRef, ScriptError> {
    let found = match field {
        "site" => store.get_site(id).await.map(|o| o.map(ObjectRef::Site)),
        "device" => store.get_device(id).await.map(|o| o.map(ObjectRef::Device)),
        "interfaces" => store.get_interface(id).await.map(|o| o.map(ObjectRef::Interface)),
        "vlan_group" => store.get_vlan_group(id).await.map(|o| o.map(ObjectRef::VlanGroup)),
        "untagged_vlan" | "tagged_vlans" => store.get_vlan(id).await.map(|o| o.map(ObjectRef::Vlan)),
        _ => return Err(ScriptError::parameter(field, "not an object field")),
    };
    found.map_err(|e| lookup_failed(field, e))?.ok_or_else(|| missing(field, id))
}

async fn single(store: &Store, raw: &RawParams, field: &str, required: bool) -> Result<ParamValue, ScriptError> {
    match raw.last(field).filter(|v| !v.trim().is_empty()) {
        Some(value) => {
            let id = parse_id(field, value)?;
            Ok(ParamValue::Object(resolve_object(store, field, id).await?))
        }
        None if required => Err(ScriptError::parameter(field, "this field is required")),
        None => Ok(ParamValue::Null),
    }
}

async fn multiple(store: &Store, raw: &RawParams, field: &str, required: bool) -> Result<ParamValue, ScriptError> {
    let mut objects = Vec::new();
    for value in raw.all(field).into_iter().filter(|v| !v.trim().is_empty()) {
        let id = parse_id(field, value)?;
        // object lists are sets; a repeated id is picked once
        if objects.iter().any(|o: &ObjectRef| o.id() == Some(id)) {
            continue;
        }
        objects.push(resolve_object(store, field, id).await?);
    }
    if required && objects.is_empty() {
        return Err(ScriptError::parameter(field, "this field is required"));
    }
    Ok(ParamValue::Objects(objects))
}

/// Decode a query string (or urlencoded form body) into a script request.
///
/// Object fields are looked up by id; pickers are checked against their
/// scope (device in site, interfaces on device, VLANs in group). `commit`
/// and `on_error` are run options and stay out of the parameter set.
pub async fn resolve(store: &Store, query: &str) -> Result<ScriptRequest, ScriptError> {
    let raw = RawParams(rerun::decode_pairs(query));
    let mut params = ParameterSet::new();

    for field in SCRIPT_FIELDS {
        let value = match *field {
            "site" | "device" => single(store, &raw, field, true).await?,
            "vlan_group" | "untagged_vlan" => single(store, &raw, field, false).await?,
            "interfaces" => multiple(store, &raw, field, true).await?,
            "tagged_vlans" => multiple(store, &raw, field, false).await?,
            "mode" => {
                let mode = raw.last(field).unwrap_or_default().trim().to_string();
                if !mode.is_empty() && InterfaceMode::from_choice(&mode).is_none() {
                    return Err(ScriptError::parameter(
                        field,
                        format!(
                            "'{}' is not one of the available choices ({})",
                            mode,
                            interface_mode::ALL.join(", ")
                        ),
                    ));
                }
                ParamValue::Text(mode)
            }
            _ => ParamValue::Text(raw.last(field).unwrap_or_default().to_string()),
        };
        params.insert(*field, value);
    }

    check_scope(&params)?;

    let policy = match raw.last("on_error").map(str::trim) {
        Some("continue") => Some(FailurePolicy::Continue),
        Some("stop") => Some(FailurePolicy::FailFast),
        _ => None,
    };

    Ok(ScriptRequest {
        params,
        commit: parse_flag(raw.last("commit")),
        policy,
    })
}

fn check_scope(params: &ParameterSet) -> Result<(), ScriptError> {
    let site_id = match params.object("site") {
        Some(ObjectRef::Site(s)) => Some(s.id),
        _ => None,
    };

    let device = match params.object("device") {
        Some(ObjectRef::Device(d)) => Some(d),
        _ => None,
    };

    if let (Some(site_id), Some(device)) = (site_id, device) {
        if device.site_id != Some(site_id) {
            return Err(ScriptError::parameter(
                "device",
                format!("device '{}' is not at the selected site", device.name),
            ));
        }
    }

    if let Some(device) = device {
        for obj in params.objects("interfaces") {
            if let ObjectRef::Interface(iface) = obj {
                if iface.device_id != device.id {
                    return Err(ScriptError::parameter(
                        "interfaces",
                        format!("interface '{}' does not belong to device '{}'", iface.name, device.name),
                    ));
                }
            }
        }
    }

    if let Some(ObjectRef::VlanGroup(group)) = params.object("vlan_group") {
        if let (Some(group_site), Some(site_id)) = (group.site_id, site_id) {
            if group_site != site_id {
                return Err(ScriptError::parameter(
                    "vlan_group",
                    format!("VLAN group '{}' is not at the selected site", group.name),
                ));
            }
        }

        let picked = params
            .object("untagged_vlan")
            .into_iter()
            .map(|o| ("untagged_vlan", o))
            .chain(params.objects("tagged_vlans").iter().map(|o| ("tagged_vlans", o)));
        for (field, obj) in picked {
            if let ObjectRef::Vlan(vlan) = obj {
                if vlan.group_id != Some(group.id) {
                    return Err(ScriptError::parameter(
                        field,
                        format!("VLAN {} is not in group '{}'", vlan, group.name),
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::rerun::query_string;

    async fn seeded() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.seed_demo().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_resolves_declared_fields_in_order() {
        let store = seeded().await;
        let req = resolve(
            &store,
            "site=1&device=1&interfaces=1&interfaces=2&interface_description=uplink\
             &mode=tagged&vlan_group=1&untagged_vlan=1&tagged_vlans=2&commit=on",
        )
        .await
        .unwrap();

        let names: Vec<&str> = req.params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, SCRIPT_FIELDS);
        assert!(req.commit);
        assert_eq!(req.policy, None);
        assert_eq!(req.params.objects("interfaces").len(), 2);
        assert_eq!(req.params.text("interface_description"), "uplink");
    }

    #[tokio::test]
    async fn test_round_trip_through_query_string() {
        let store = seeded().await;
        let original = resolve(
            &store,
            "site=1&device=1&interfaces=1&interfaces=3&interface_description=to+core+%231\
             &mode=access&untagged_vlan=2",
        )
        .await
        .unwrap();

        let encoded = query_string(&original.params);
        let decoded = resolve(&store, &encoded).await.unwrap();
        assert!(decoded.params.equivalent(&original.params));

        // pair order does not matter
        let mut pairs: Vec<&str> = encoded.split('&').collect();
        pairs.reverse();
        let reordered = resolve(&store, &pairs.join("&")).await.unwrap();
        assert!(reordered.params.equivalent(&original.params));
        assert_ne!(reordered.params, original.params);
    }

    #[tokio::test]
    async fn test_optional_fields_default_to_empty() {
        let store = seeded().await;
        let req = resolve(&store, "site=1&device=1&interfaces=1").await.unwrap();

        assert_eq!(req.params.get("interface_description"), Some(&ParamValue::Text(String::new())));
        assert_eq!(req.params.get("vlan_group"), Some(&ParamValue::Null));
        assert_eq!(req.params.get("tagged_vlans"), Some(&ParamValue::Objects(vec![])));
        assert!(!req.commit);
        assert_eq!(query_string(&req.params), "site=1&device=1&interfaces=1&interface_description=&mode=");
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let store = seeded().await;

        let err = resolve(&store, "site=1&device=1").await.unwrap_err();
        assert!(matches!(err, ScriptError::Parameter { ref field, .. } if field == "interfaces"));

        let err = resolve(&store, "site=1&device=1&interfaces=999").await.unwrap_err();
        assert!(err.to_string().contains("no object with id 999"));

        let err = resolve(&store, "site=1&device=1&interfaces=x").await.unwrap_err();
        assert!(err.to_string().contains("not a valid object id"));

        let err = resolve(&store, "site=1&device=1&interfaces=1&mode=trunk").await.unwrap_err();
        assert!(err.to_string().starts_with("mode:"));
    }

    #[tokio::test]
    async fn test_vlans_must_be_in_selected_group() {
        let store = seeded().await;
        let err = resolve(&store, "site=1&device=1&interfaces=1&vlan_group=1&tagged_vlans=5")
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::Parameter { ref field, .. } if field == "tagged_vlans"));
    }

    #[tokio::test]
    async fn test_run_options() {
        let store = seeded().await;
        let req = resolve(&store, "site=1&device=1&interfaces=1&commit=false&on_error=continue")
            .await
            .unwrap();
        assert!(!req.commit);
        assert_eq!(req.policy, Some(FailurePolicy::Continue));
    }
}
