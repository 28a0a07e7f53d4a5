use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::{Device, InterfaceRecord, Site, Vlan, VlanGroup};

/// An object picked through one of the script's object fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "object", rename_all = "snake_case")]
pub enum ObjectRef {
    Site(Site),
    Device(Device),
    Interface(InterfaceRecord),
    VlanGroup(VlanGroup),
    Vlan(Vlan),
}

impl ObjectRef {
    /// Primary key of the referenced object, if it has been saved
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Site(s) => Some(s.id),
            Self::Device(d) => Some(d.id),
            Self::Interface(i) => i.id,
            Self::VlanGroup(g) => Some(g.id),
            Self::Vlan(v) => Some(v.id),
        }
    }
}

/// Value of a single script parameter.
///
/// Scalars arrive from a query string and stay text. `Null` stands for an optional object field left unset; it has no
/// identity and is never written to a query string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Object(ObjectRef),
    Objects(Vec<ObjectRef>),
    Null,
}

/// ParameterSet keeps script parameters in their declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter. Re-inserting an existing name keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Same names and values, ignoring the member order of object lists
    #[cfg(test)]
    pub fn equivalent(&self, other: &ParameterSet) -> bool {
        fn ids(list: &[ObjectRef]) -> Vec<Option<i64>> {
            let mut ids: Vec<Option<i64>> = list.iter().map(ObjectRef::id).collect();
            ids.sort();
            ids
        }

        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(name, value)| match (value, other.get(name)) {
                (ParamValue::Objects(a), Some(ParamValue::Objects(b))) => ids(a) == ids(b),
                (a, Some(b)) => a == b,
                (_, None) => false,
            })
    }

    /// Text value of a parameter, or "" when absent or not text
    pub fn text(&self, name: &str) -> &str {
        match self.get(name) {
            Some(ParamValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn object(&self, name: &str) -> Option<&ObjectRef> {
        match self.get(name) {
            Some(ParamValue::Object(o)) => Some(o),
            _ => None,
        }
    }

    pub fn objects(&self, name: &str) -> &[ObjectRef] {
        match self.get(name) {
            Some(ParamValue::Objects(list)) => list,
            _ => &[],
        }
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlan(id: i64, vid: i32) -> Vlan {
        Vlan { id, vid, name: format!("v{}", vid), group_id: None, site_id: None }
    }

    #[test]
    fn test_insert_keeps_declaration_order() {
        let mut params = ParameterSet::new();
        params.insert("mode", ParamValue::Text("access".into()));
        params.insert("interface_description", ParamValue::Text("a".into()));
        params.insert("mode", ParamValue::Text("tagged".into()));

        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["mode", "interface_description"]);
        assert_eq!(params.text("mode"), "tagged");
        assert_eq!(params.iter().count(), 2);
    }

    #[test]
    fn test_typed_accessors() {
        let mut params = ParameterSet::new();
        params.insert("untagged_vlan", ParamValue::Object(ObjectRef::Vlan(vlan(3, 30))));
        params.insert("tagged_vlans", ParamValue::Objects(vec![ObjectRef::Vlan(vlan(1, 10))]));
        params.insert("vlan_group", ParamValue::Null);

        assert_eq!(params.object("untagged_vlan").and_then(|o| o.id()), Some(3));
        assert_eq!(params.objects("tagged_vlans").len(), 1);
        assert!(params.object("vlan_group").is_none());
        assert!(params.objects("missing").is_empty());
        assert_eq!(params.text("untagged_vlan"), "");
    }

    #[test]
    fn test_equivalent_ignores_list_order() {
        let mut a = ParameterSet::new();
        a.insert("mode", ParamValue::Text("tagged".into()));
        a.insert(
            "tagged_vlans",
            ParamValue::Objects(vec![ObjectRef::Vlan(vlan(1, 10)), ObjectRef::Vlan(vlan(2, 20))]),
        );
        let mut b = ParameterSet::new();
        b.insert(
            "tagged_vlans",
            ParamValue::Objects(vec![ObjectRef::Vlan(vlan(2, 20)), ObjectRef::Vlan(vlan(1, 10))]),
        );
        b.insert("mode", ParamValue::Text("tagged".into()));

        assert!(a.equivalent(&b));
        assert_ne!(a, b);

        b.insert("tagged_vlans", ParamValue::Objects(vec![ObjectRef::Vlan(vlan(1, 10))]));
        assert!(!a.equivalent(&b));
        b.insert("mode", ParamValue::Text("access".into()));
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let mut params = ParameterSet::new();
        params.insert("mode", ParamValue::Text("access".into()));
        params.insert("vlan_group", ParamValue::Null);

        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"mode":"access","vlan_group":null}"#);
    }
}
