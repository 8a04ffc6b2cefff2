//! Per-device state: the address learning table and port admin state.
//!
//! The handler consumes these through the two small traits below; the
//! bundled [`SwitchRegistry`] keeps everything in process memory. A device's
//! entry is only ever touched under its shard lock, so a single device's
//! table is never read mid-write while unrelated devices proceed in
//! parallel.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use dashmap::DashMap;
use ofp_codec::{DatapathId, MacAddr};

use crate::error::RegistryError;

/// Where hardware addresses were last seen, per device.
#[async_trait]
pub trait AddressTable: Send + Sync {
    /// Records that `mac` was observed entering `dpid` on `port`.
    async fn learn(&self, dpid: DatapathId, mac: MacAddr, port: u32)
        -> Result<(), RegistryError>;

    /// Ports known to reach `mac` on `dpid`, ascending; empty when unknown.
    async fn lookup(&self, dpid: DatapathId, mac: MacAddr) -> Result<Vec<u32>, RegistryError>;
}

/// Administrative forwarding state of device ports.
#[async_trait]
pub trait InterfaceState: Send + Sync {
    /// Whether the port currently permits forwarding. An `Err` means the
    /// state cannot be determined; callers must treat that as disabled.
    async fn is_forwarding_enabled(
        &self,
        dpid: DatapathId,
        port: u32,
    ) -> Result<bool, RegistryError>;
}

#[derive(Debug, Default)]
struct DeviceEntry {
    mac_table: HashMap<MacAddr, BTreeSet<u32>>,
    port_state: HashMap<u32, bool>,
}

/// In-memory implementation of both collaborator traits.
#[derive(Debug, Default)]
pub struct SwitchRegistry {
    devices: DashMap<DatapathId, DeviceEntry>,
}

impl SwitchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the admin state of a port, creating the device entry on
    /// first use. Fed by the platform's port-status handling.
    pub fn set_port_forwarding(&self, dpid: DatapathId, port: u32, enabled: bool) {
        self.devices
            .entry(dpid)
            .or_default()
            .port_state
            .insert(port, enabled);
    }
}

#[async_trait]
impl AddressTable for SwitchRegistry {
    async fn learn(
        &self,
        dpid: DatapathId,
        mac: MacAddr,
        port: u32,
    ) -> Result<(), RegistryError> {
        self.devices
            .entry(dpid)
            .or_default()
            .mac_table
            .entry(mac)
            .or_default()
            .insert(port);
        Ok(())
    }

    async fn lookup(&self, dpid: DatapathId, mac: MacAddr) -> Result<Vec<u32>, RegistryError> {
        let ports = self
            .devices
            .get(&dpid)
            .and_then(|entry| {
                entry
                    .mac_table
                    .get(&mac)
                    .map(|ports| ports.iter().copied().collect())
            })
            .unwrap_or_default();
        Ok(ports)
    }
}

#[async_trait]
impl InterfaceState for SwitchRegistry {
    async fn is_forwarding_enabled(
        &self,
        dpid: DatapathId,
        port: u32,
    ) -> Result<bool, RegistryError> {
        let entry = self
            .devices
            .get(&dpid)
            .ok_or(RegistryError::UnknownDevice(dpid))?;
        entry
            .port_state
            .get(&port)
            .copied()
            .ok_or(RegistryError::UnknownPort { dpid, port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(b: u8) -> MacAddr {
        MacAddr([b; 6])
    }

    #[tokio::test]
    async fn test_learn_then_lookup() {
        let registry = SwitchRegistry::new();
        let dpid = DatapathId(1);

        assert!(registry.lookup(dpid, mac(0xaa)).await.unwrap().is_empty());

        registry.learn(dpid, mac(0xaa), 3).await.unwrap();
        assert_eq!(registry.lookup(dpid, mac(0xaa)).await.unwrap(), vec![3]);

        // relearning the same port is idempotent
        registry.learn(dpid, mac(0xaa), 3).await.unwrap();
        assert_eq!(registry.lookup(dpid, mac(0xaa)).await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_lookup_returns_ports_ascending() {
        let registry = SwitchRegistry::new();
        let dpid = DatapathId(1);

        registry.learn(dpid, mac(0xaa), 7).await.unwrap();
        registry.learn(dpid, mac(0xaa), 2).await.unwrap();
        registry.learn(dpid, mac(0xaa), 5).await.unwrap();

        assert_eq!(
            registry.lookup(dpid, mac(0xaa)).await.unwrap(),
            vec![2, 5, 7]
        );
    }

    #[tokio::test]
    async fn test_devices_are_isolated() {
        let registry = SwitchRegistry::new();

        registry.learn(DatapathId(1), mac(0xaa), 1).await.unwrap();
        assert!(registry
            .lookup(DatapathId(2), mac(0xaa))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_port_state() {
        let registry = SwitchRegistry::new();
        let dpid = DatapathId(1);

        assert!(matches!(
            registry.is_forwarding_enabled(dpid, 1).await,
            Err(RegistryError::UnknownDevice(_))
        ));

        registry.set_port_forwarding(dpid, 1, true);
        registry.set_port_forwarding(dpid, 2, false);

        assert!(registry.is_forwarding_enabled(dpid, 1).await.unwrap());
        assert!(!registry.is_forwarding_enabled(dpid, 2).await.unwrap());
        assert!(matches!(
            registry.is_forwarding_enabled(dpid, 9).await,
            Err(RegistryError::UnknownPort { port: 9, .. })
        ));
    }
}
