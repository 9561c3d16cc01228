//! Registry of paired devices

use chrono::{DateTime, Utc};

use crate::error::CareError;
use crate::store::kv::KeyValueStore;
use crate::types::Device;

/// Storage key of the persisted device list
pub const DEVICES_STORAGE_KEY: &str = "@touchcare_devices";

/// Paired devices, persisted as one JSON array after every mutation
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// A missing key leaves the registry empty. Persisted data that fails to
    /// parse is logged and discarded.
    pub fn load(&mut self, store: &impl KeyValueStore) -> Result<usize, CareError> {
        let Some(json) = store.load(DEVICES_STORAGE_KEY)? else {
            self.devices.clear();
            return Ok(0);
        };

        match serde_json::from_str::<Vec<Device>>(&json) {
            Ok(devices) => self.devices = devices,
            Err(e) => {
                log::warn!("discarding unreadable device list: {e}");
                self.devices.clear();
            }
        }
        Ok(self.devices.len())
    }

    /// Register a device as connected, stamped with `added_at`
    pub fn add(
        &mut self,
        store: &mut impl KeyValueStore,
        device: Device,
        added_at: DateTime<Utc>,
    ) -> Result<&Device, CareError> {
        if self.contains(&device.id) {
            return Err(CareError::DeviceError(format!(
                "device {} is already registered",
                device.id
            )));
        }

        let mut next = self.devices.clone();
        next.push(Device {
            is_connected: true,
            added_at: Some(added_at),
            ..device
        });
        self.persist(store, next)?;

        let added = self.devices.len() - 1;
        Ok(&self.devices[added])
    }

    /// Unregister a device; returns whether it was registered
    pub fn remove(&mut self, store: &mut impl KeyValueStore, device_id: &str) -> Result<bool, CareError> {
        let next: Vec<Device> = self
            .devices
            .iter()
            .filter(|d| d.id != device_id)
            .cloned()
            .collect();
        let removed = next.len() < self.devices.len();
        self.persist(store, next)?;
        Ok(removed)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn get(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.get(device_id).is_some()
    }

    /// Save `next` and adopt it only once the write succeeded
    fn persist(&mut self, store: &mut impl KeyValueStore, next: Vec<Device>) -> Result<(), CareError> {
        let json = serde_json::to_string(&next)?;
        store.save(DEVICES_STORAGE_KEY, &json)?;
        self.devices = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryStore;
    use crate::types::IconType;

    fn device(id: &str) -> Device {
        Device {
            id: id.to_string(),
            name: "터치미니+ #001".to_string(),
            mac_address: "AA:BB:CC:DD:EE:01".to_string(),
            icon: "bluetooth".to_string(),
            icon_type: IconType::MaterialIcons,
            is_connected: false,
            added_at: None,
        }
    }

    #[test]
    fn test_add_marks_connected_and_persists() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new();
        let now = Utc::now();

        let added = registry.add(&mut store, device("device-1"), now).unwrap();
        assert!(added.is_connected);
        assert_eq!(added.added_at, Some(now));

        let mut reloaded = DeviceRegistry::new();
        assert_eq!(reloaded.load(&store).unwrap(), 1);
        assert_eq!(reloaded.devices(), registry.devices());
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new();
        registry.add(&mut store, device("device-1"), Utc::now()).unwrap();

        let err = registry
            .add(&mut store, device("device-1"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CareError::DeviceError(_)));
        assert_eq!(registry.devices().len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = MemoryStore::new();
        let mut registry = DeviceRegistry::new();
        registry.add(&mut store, device("device-1"), Utc::now()).unwrap();
        registry.add(&mut store, device("device-2"), Utc::now()).unwrap();

        assert!(registry.remove(&mut store, "device-1").unwrap());
        assert!(!registry.remove(&mut store, "device-1").unwrap());
        assert!(registry.contains("device-2"));

        let mut reloaded = DeviceRegistry::new();
        reloaded.load(&store).unwrap();
        assert_eq!(reloaded.devices().len(), 1);
    }

    #[test]
    fn test_load_corrupt_data_leaves_registry_empty() {
        let mut store = MemoryStore::new();
        store.save(DEVICES_STORAGE_KEY, "{not json").unwrap();

        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.load(&store).unwrap(), 0);
        assert!(registry.devices().is_empty());
    }

    #[test]
    fn test_load_app_written_shape() {
        let mut store = MemoryStore::new();
        store
            .save(
                DEVICES_STORAGE_KEY,
                r#"[{"id":"device-1","name":"터치미니+ #001","macAddress":"AA:BB:CC:DD:EE:01",
                    "icon":"bluetooth","iconType":"MaterialIcons","isConnected":true,
                    "addedAt":"2026-02-20T09:30:00.000Z"}]"#,
            )
            .unwrap();

        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.load(&store).unwrap(), 1);
        let loaded = registry.get("device-1").unwrap();
        assert_eq!(loaded.icon_type, IconType::MaterialIcons);
        assert!(loaded.is_connected);
        assert_eq!(
            loaded.added_at.unwrap().to_rfc3339(),
            "2026-02-20T09:30:00+00:00"
        );

        // A later add keeps the app's device and writes the same shape back
        registry.add(&mut store, device("device-2"), Utc::now()).unwrap();
        let saved = store.load(DEVICES_STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["id"], "device-1");
        assert_eq!(value[0]["macAddress"], "AA:BB:CC:DD:EE:01");
        assert_eq!(value[1]["isConnected"], true);
    }

    #[test]
    fn test_load_catalog_entry_with_empty_added_at() {
        let mut store = MemoryStore::new();
        store
            .save(
                DEVICES_STORAGE_KEY,
                r#"[{"id":"device-1","name":"터치미니+ #001","macAddress":"AA:BB:CC:DD:EE:01",
                    "icon":"bluetooth","iconType":"MaterialIcons","isConnected":false,
                    "addedAt":""}]"#,
            )
            .unwrap();

        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.load(&store).unwrap(), 1);
        assert_eq!(registry.get("device-1").unwrap().added_at, None);
    }
}
