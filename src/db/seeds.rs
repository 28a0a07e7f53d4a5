use anyhow::Result;

use super::devices::DeviceRepo;
use super::interfaces::InterfaceRepo;
use super::sites::SiteRepo;
use super::vlans::{VlanGroupRepo, VlanRepo};
use super::Store;

/// Demo VLANs (vid, name) created in the lab VLAN group
pub fn seed_vlan_params() -> Vec<(i32, &'static str)> {
    vec![(1, "default"), (10, "users"), (20, "voice"), (30, "mgmt")]
}

/// Demo devices and their interfaces
pub fn seed_device_params() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("leaf1", vec!["eth0", "eth1", "eth2", "eth3"]),
        ("leaf2", vec!["eth0"]),
    ]
}

impl Store {
    /// Seed a small lab (one site, two devices, one VLAN group) into an empty database
    pub async fn seed_demo(&self) -> Result<()> {
        if DeviceRepo::count(&self.pool).await? > 0 {
            return Ok(());
        }

        let site = SiteRepo::create(&self.pool, "Lab", "lab").await?;

        for (name, interfaces) in seed_device_params() {
            let device = DeviceRepo::create(&self.pool, name, Some(site.id)).await?;
            for iface in interfaces {
                InterfaceRepo::create(&self.pool, device.id, iface).await?;
            }
        }

        let group = VlanGroupRepo::create(&self.pool, "Lab VLANs", "lab-vlans", Some(site.id)).await?;
        for (vid, name) in seed_vlan_params() {
            VlanRepo::create(&self.pool, vid, name, Some(group.id), Some(site.id)).await?;
        }
        // a global VLAN outside any group
        VlanRepo::create(&self.pool, 99, "transit", None, None).await?;

        tracing::info!("Seeded demo site '{}'", site.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        store.seed_demo().await.unwrap();
        store.seed_demo().await.unwrap();

        assert_eq!(store.list_devices().await.unwrap().len(), 2);
        assert_eq!(store.list_sites().await.unwrap().len(), 1);
        let leaf1 = store.list_device_interfaces(1).await.unwrap();
        let names: Vec<&str> = leaf1.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["eth0", "eth1", "eth2", "eth3"]);
        assert_eq!(leaf1[0].device_name, "leaf1");
        assert_eq!(leaf1[0].site_id, Some(1));
    }

    #[tokio::test]
    async fn test_vlan_scoping() {
        let store = Store::in_memory().await.unwrap();
        store.seed_demo().await.unwrap();

        let in_group = store
            .list_vlans(&crate::models::VlanScopeQuery { site_id: None, group_id: Some(1) })
            .await
            .unwrap();
        let vids: Vec<i32> = in_group.iter().map(|v| v.vid).collect();
        assert_eq!(vids, vec![1, 10, 20, 30]);

        let at_site = store
            .list_vlans(&crate::models::VlanScopeQuery { site_id: Some(1), group_id: None })
            .await
            .unwrap();
        assert_eq!(at_site.len(), 5);

        assert_eq!(store.list_vlan_groups(Some(1)).await.unwrap().len(), 1);
        assert!(store.list_vlan_groups(Some(2)).await.unwrap().is_empty());
    }
}
