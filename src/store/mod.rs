//! Application state
//!
//! Session and device state live in an explicit [`AppState`] that the host
//! passes to its views. Persistence is injected as a [`KeyValueStore`].

mod devices;
mod kv;
mod session;

pub use devices::{DeviceRegistry, DEVICES_STORAGE_KEY};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use session::SessionState;

use chrono::Utc;

use crate::auth::MockAuthenticator;
use crate::device::{available_devices, DeviceProvider};
use crate::error::CareError;
use crate::types::{Device, User};

/// Session, paired devices and the store backing them
pub struct AppState<S: KeyValueStore> {
    store: S,
    session: SessionState,
    devices: DeviceRegistry,
}

impl<S: KeyValueStore> AppState<S> {
    /// Wrap a store; call [`AppState::load`] to read persisted state
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: SessionState::new(),
            devices: DeviceRegistry::new(),
        }
    }

    /// Open a store and read persisted devices
    pub fn open(store: S) -> Result<Self, CareError> {
        let mut state = Self::new(store);
        state.load()?;
        Ok(state)
    }

    pub fn load(&mut self) -> Result<usize, CareError> {
        self.devices.load(&self.store)
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Sign in with the app credentials
    pub fn login(&mut self, id: &str, password: &str) -> Result<User, CareError> {
        let user = MockAuthenticator.login(id, password)?;
        self.session.set_user(Some(user.clone()));
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.session.clear_user();
    }

    pub fn devices(&self) -> &[Device] {
        self.devices.devices()
    }

    pub fn add_device(&mut self, device: Device) -> Result<&Device, CareError> {
        self.devices.add(&mut self.store, device, Utc::now())
    }

    pub fn remove_device(&mut self, device_id: &str) -> Result<bool, CareError> {
        self.devices.remove(&mut self.store, device_id)
    }

    /// Discovered devices that are not registered yet
    pub fn discover_devices(&self, provider: &dyn DeviceProvider) -> Result<Vec<Device>, CareError> {
        available_devices(provider, &self.devices)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDeviceProvider;

    #[test]
    fn test_pairing_flow() {
        let mut state = AppState::open(MemoryStore::new()).unwrap();
        let mut provider = MockDeviceProvider::new();

        assert!(state.discover_devices(&provider).is_err());
        provider.activate_bluetooth().unwrap();

        let found = state.discover_devices(&provider).unwrap();
        assert_eq!(found.len(), 1);

        let added = state.add_device(found[0].clone()).unwrap();
        assert!(added.is_connected);
        assert!(added.added_at.is_some());
        assert!(state.discover_devices(&provider).unwrap().is_empty());

        // Persisted state survives a restart
        let store = state.into_store();
        let state = AppState::open(store).unwrap();
        assert_eq!(state.devices().len(), 1);
        assert_eq!(state.devices()[0].id, "device-1");
    }

    #[test]
    fn test_login_logout() {
        let mut state = AppState::new(MemoryStore::new());

        assert!(state.login("touch", "wrong").is_err());
        assert!(state.user().is_none());

        let user = state.login("touch", "ntp1231").unwrap();
        assert_eq!(user.email, "NTP@ntpercent.ai");
        assert!(state.session().is_authenticated());

        state.logout();
        assert!(state.user().is_none());
    }

    #[test]
    fn test_remove_device() {
        let mut state = AppState::new(MemoryStore::new());
        let mut provider = MockDeviceProvider::new();
        provider.activate_bluetooth().unwrap();
        let device = state.discover_devices(&provider).unwrap().remove(0);

        state.add_device(device).unwrap();
        assert!(state.remove_device("device-1").unwrap());
        assert!(state.devices().is_empty());
        assert_eq!(state.store().load(DEVICES_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }
}
