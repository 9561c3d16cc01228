//! Device discovery and the dashboard touch counter
//!
//! Discovery sits behind [`DeviceProvider`] so the Bluetooth stack can be
//! swapped without touching the registry. [`MockDeviceProvider`] stands in for
//! the hardware with a fixed catalog.

use uuid::Uuid;

use crate::calendar::Calendar;
use crate::error::CareError;
use crate::store::DeviceRegistry;
use crate::types::{Device, IconType, TouchRecord};

/// Touches for one full turn of the progress ring
pub const TOUCHES_PER_CYCLE: u64 = 100;

/// Source of pairable devices
pub trait DeviceProvider {
    /// Turn the radio on; discovery fails until this succeeds
    fn activate_bluetooth(&mut self) -> Result<(), CareError>;

    fn is_bluetooth_active(&self) -> bool;

    /// Devices currently in range
    fn discover(&self) -> Result<Vec<Device>, CareError>;
}

/// Provider backed by the built-in catalog
#[derive(Debug, Clone)]
pub struct MockDeviceProvider {
    catalog: Vec<Device>,
    bluetooth_active: bool,
}

impl Default for MockDeviceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDeviceProvider {
    /// Provider advertising the built-in catalog
    pub fn new() -> Self {
        Self::with_catalog(default_catalog())
    }

    pub fn with_catalog(catalog: Vec<Device>) -> Self {
        Self {
            catalog,
            bluetooth_active: false,
        }
    }
}

impl DeviceProvider for MockDeviceProvider {
    fn activate_bluetooth(&mut self) -> Result<(), CareError> {
        self.bluetooth_active = true;
        Ok(())
    }

    fn is_bluetooth_active(&self) -> bool {
        self.bluetooth_active
    }

    fn discover(&self) -> Result<Vec<Device>, CareError> {
        if !self.bluetooth_active {
            return Err(CareError::DeviceError("bluetooth is not active".to_string()));
        }
        Ok(self.catalog.clone())
    }
}

/// Devices shipped with the app
pub fn default_catalog() -> Vec<Device> {
    vec![Device {
        id: "device-1".to_string(),
        name: "터치미니+ #001".to_string(),
        mac_address: "AA:BB:CC:DD:EE:01".to_string(),
        icon: "bluetooth".to_string(),
        icon_type: IconType::MaterialIcons,
        is_connected: false,
        added_at: None,
    }]
}

/// Discovered devices minus the ones already registered
pub fn available_devices(
    provider: &dyn DeviceProvider,
    registry: &DeviceRegistry,
) -> Result<Vec<Device>, CareError> {
    Ok(provider
        .discover()?
        .into_iter()
        .filter(|d| !registry.contains(&d.id))
        .collect())
}

/// Dashboard counter for one device session
#[derive(Debug, Clone, Default)]
pub struct TouchCounter {
    total: u64,
}

impl TouchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a touch at `timestamp_ms` and mint its record
    pub fn touch(&mut self, timestamp_ms: i64, calendar: &Calendar) -> Result<TouchRecord, CareError> {
        let record = TouchRecord::from_timestamp(Uuid::new_v4().to_string(), timestamp_ms, calendar)?;
        self.total += 1;
        Ok(record)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Position in the current ring, 0-99
    pub fn progress(&self) -> u64 {
        self.total % TOUCHES_PER_CYCLE
    }

    /// Completed rings
    pub fn cycles(&self) -> u64 {
        self.total / TOUCHES_PER_CYCLE
    }

    pub fn reset(&mut self) {
        self.total = 0;
    }
}
