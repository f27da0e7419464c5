use std::{collections::HashSet, fmt};

/// A runtime-revocable permission the platform must hold before the radio
/// may be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grant {
    FineLocation,
    Scan,
    Connect,
    Bluetooth,
    BluetoothAdmin,
}
impl Grant {
    pub const ALL: [Grant; 5] = [
        Grant::FineLocation,
        Grant::Scan,
        Grant::Connect,
        Grant::Bluetooth,
        Grant::BluetoothAdmin,
    ];
    pub fn name(self) -> &'static str {
        match self {
            Grant::FineLocation => "FINE_LOCATION",
            Grant::Scan => "SCAN",
            Grant::Connect => "CONNECT",
            Grant::Bluetooth => "BLUETOOTH",
            Grant::BluetoothAdmin => "BLUETOOTH_ADMIN",
        }
    }
    /// Grants a platform at `level` asks for before it lets an app scan.
    /// Level 31 split the legacy bluetooth permissions into scan/connect.
    pub fn for_api_level(level: u32) -> Vec<Grant> {
        if level >= 31 {
            vec![Grant::FineLocation, Grant::Scan, Grant::Connect]
        } else {
            vec![Grant::FineLocation, Grant::Bluetooth, Grant::BluetoothAdmin]
        }
    }
}
impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioStatus {
    Enabled,
    Disabled,
    Unsupported,
}

/// Point-in-time read of what the platform currently allows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityState {
    pub grants_held: HashSet<Grant>,
    pub radio: RadioStatus,
}
impl CapabilityState {
    pub fn radio_enabled(&self) -> bool {
        self.radio == RadioStatus::Enabled
    }
    /// Required grants not currently held, in the order they were required.
    pub fn missing(&self, required: &[Grant]) -> Vec<Grant> {
        missing_grants(&self.grants_held, required)
    }
}
pub(crate) fn missing_grants(held: &HashSet<Grant>, required: &[Grant]) -> Vec<Grant> {
    let mut missing = Vec::new();
    for grant in required {
        if !held.contains(grant) && !missing.contains(grant) {
            missing.push(*grant);
        }
    }
    missing
}
