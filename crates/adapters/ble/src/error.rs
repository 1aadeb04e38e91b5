//! BLE adapter error types.

use hueflow_domain::error::DeviceError;

/// Errors specific to the BLE adapter.
#[derive(Debug, thiserror::Error)]
pub enum BleError {
    /// No BLE adapter found on the host.
    #[error("no BLE adapter available")]
    NotAvailable,

    /// A BLE scan, connection or GATT operation failed.
    #[error("BLE operation failed")]
    Ble(#[from] btleplug::Error),

    /// The configured address is not a MAC address.
    #[error("invalid light address {0:?}")]
    InvalidAddress(String),

    /// The scan ended without seeing the light.
    #[error("light {address} not found")]
    NotFound {
        /// The address that was searched for.
        address: String,
    },

    /// The light does not expose a required characteristic.
    #[error("characteristic {uuid} not found")]
    CharacteristicNotFound {
        /// The missing characteristic.
        uuid: uuid::Uuid,
    },
}

impl BleError {
    /// Convert into a [`DeviceError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_device(self) -> DeviceError {
        match self {
            Self::NotFound { address } => DeviceError::NotFound { address },
            Self::Ble(btleplug::Error::NotConnected) => DeviceError::Disconnected,
            other => DeviceError::Transport(Box::new(other)),
        }
    }
}

impl From<BleError> for DeviceError {
    fn from(err: BleError) -> Self {
        err.into_device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_available_error() {
        let err = BleError::NotAvailable;
        assert_eq!(err.to_string(), "no BLE adapter available");
    }

    #[test]
    fn should_display_invalid_address_error() {
        let err = BleError::InvalidAddress("nope".into());
        assert_eq!(err.to_string(), "invalid light address \"nope\"");
    }

    #[test]
    fn should_convert_not_found_to_device_not_found() {
        let err: DeviceError = BleError::NotFound {
            address: "AA:BB:CC:DD:EE:FF".into(),
        }
        .into();
        assert!(matches!(err, DeviceError::NotFound { address } if address == "AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn should_convert_not_connected_to_disconnected() {
        let err: DeviceError = BleError::Ble(btleplug::Error::NotConnected).into();
        assert!(matches!(err, DeviceError::Disconnected));
    }

    #[test]
    fn should_convert_other_errors_to_transport() {
        let err: DeviceError = BleError::Ble(btleplug::Error::DeviceNotFound).into();
        assert!(matches!(err, DeviceError::Transport(_)));

        let err: DeviceError = BleError::NotAvailable.into();
        assert!(matches!(err, DeviceError::Transport(_)));
    }
}
