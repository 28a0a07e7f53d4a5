use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::models::{InterfaceMode, InterfaceRecord};

const INTERFACE_CONFIG_TEMPLATE: &str = r#"config
{%- for iface in interfaces %}
interface {{ iface.name }}
{%- if iface.description %}
    description {{ iface.description }}
{%- endif %}
{%- for line in iface.vlan_lines %}
    {{ line }}
{%- endfor %}
{%- endfor %}
"#;

#[derive(Serialize)]
struct InterfaceView<'a> {
    name: &'a str,
    description: &'a str,
    vlan_lines: Vec<String>,
}

/// VLAN configuration lines for an interface, chosen by its current mode
fn vlan_lines(iface: &InterfaceRecord) -> Vec<String> {
    let mut lines = Vec::new();
    match iface.mode {
        Some(InterfaceMode::Access) => {
            if let Some(vlan) = &iface.untagged_vlan {
                lines.push(format!("vlan access {}", vlan.vid));
            }
        }
        Some(InterfaceMode::Tagged) => {
            if let Some(vlan) = &iface.untagged_vlan {
                lines.push(format!("vlan trunk native {}", vlan.vid));
            }
            if !iface.tagged_vlans.is_empty() {
                let vids: Vec<String> = iface.tagged_vlans.iter().map(|v| v.vid.to_string()).collect();
                lines.push(format!("vlan trunk allowed {}", vids.join(",")));
            }
        }
        Some(InterfaceMode::TaggedAll) => lines.push("vlan trunk allowed all".to_string()),
        // no VLAN syntax for these
        Some(InterfaceMode::QInQ) | None => {}
    }
    lines
}

/// Render the configuration preview for a set of interfaces from their in-memory state
pub fn render_interface_config(interfaces: &[InterfaceRecord]) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("interfaces", INTERFACE_CONFIG_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Invalid interface template: {}", e))?;

    let views: Vec<InterfaceView> = interfaces
        .iter()
        .map(|iface| InterfaceView {
            name: &iface.name,
            description: &iface.description,
            vlan_lines: vlan_lines(iface),
        })
        .collect();

    let mut context = Context::new();
    context.insert("interfaces", &views);

    tera.render("interfaces", &context)
        .map_err(|e| anyhow::anyhow!("Template rendering failed: {}", e))
}
