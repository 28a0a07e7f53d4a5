use url::form_urlencoded;

use crate::models::{ParamValue, ParameterSet};

fn encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Encode a parameter set as a query string, in declaration order.
///
/// Text becomes `name=value`, an object becomes `name=<id>` and an
/// object list one `name=<id>` pair per member. Values without an identity
/// (unset optional fields, unsaved objects) emit nothing.
pub fn query_string(params: &ParameterSet) -> String {
    let mut pairs: Vec<String> = Vec::new();

    for (name, value) in params.iter() {
        let name = encode(name);
        match value {
            ParamValue::Text(s) => pairs.push(format!("{}={}", name, encode(s))),
            ParamValue::Object(obj) => {
                if let Some(id) = obj.id() {
                    pairs.push(format!("{}={}", name, id));
                }
            }
            ParamValue::Objects(list) => {
                pairs.extend(list.iter().filter_map(|o| o.id()).map(|id| format!("{}={}", name, id)));
            }
            ParamValue::Null => {}
        }
    }

    pairs.join("&")
}

/// Build the link that re-opens the script with the same inputs
pub fn rerun_link(base_path: &str, params: &ParameterSet) -> String {
    format!("{}?{}", base_path, query_string(params))
}

/// Split a query string (or urlencoded body) into ordered name/value pairs
pub fn decode_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.trim_start_matches('?');
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
