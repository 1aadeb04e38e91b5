//! # hueflow-adapter-ble
//!
//! Drives a Philips Hue Bluetooth light through `btleplug`.
//!
//! [`HueBleConnector`] scans for the configured MAC address, connects and
//! discovers the light-control service; the resulting [`HueBleLight`]
//! turns each port call into one GATT write (see [`gatt`]).
//!
//! The light must already be paired with the host.
//!
//! ## Dependency rule
//!
//! Depends on `hueflow-app` (port traits) and `hueflow-domain` only.

mod config;
mod error;
pub mod gatt;

pub use config::HueBleConfig;
pub use error::BleError;

use std::time::Duration;

use btleplug::api::{
    BDAddr, Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio_stream::{Stream, StreamExt as _};

use hueflow_app::ports::{Light, LightConnector};
use hueflow_domain::colour::ColourXY;
use hueflow_domain::error::DeviceError;
use hueflow_domain::light::{Brightness, Mireds};

/// Finds and connects to one Hue light by MAC address.
#[derive(Debug, Clone)]
pub struct HueBleConnector {
    config: HueBleConfig,
}

impl HueBleConnector {
    #[must_use]
    pub fn new(config: HueBleConfig) -> Self {
        Self { config }
    }

    async fn open(&self) -> Result<HueBleLight, BleError> {
        let address: BDAddr = self
            .config
            .address
            .parse()
            .map_err(|_| BleError::InvalidAddress(self.config.address.clone()))?;

        let peripheral = self.find(address).await?;
        peripheral.connect().await?;
        peripheral.discover_services().await?;
        tracing::info!(%address, "connected to Hue light");

        HueBleLight::new(peripheral)
    }

    async fn find(&self, address: BDAddr) -> Result<Peripheral, BleError> {
        let manager = Manager::new().await?;
        let central = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(BleError::NotAvailable)?;

        let mut events = central.events().await?;
        central.start_scan(ScanFilter::default()).await?;
        tracing::info!(
            %address,
            timeout_secs = self.config.scan_timeout_secs,
            "BLE scan started"
        );

        let found = scan_for(&central, &mut events, address, self.config.scan_timeout()).await;

        if let Err(err) = central.stop_scan().await {
            tracing::warn!(%err, "failed to stop BLE scan");
        }

        found?.ok_or_else(|| BleError::NotFound {
            address: self.config.address.clone(),
        })
    }
}

/// Wait for `address` to show up, checking already known peripherals first.
async fn scan_for<S>(
    central: &Adapter,
    events: &mut S,
    address: BDAddr,
    timeout: Duration,
) -> Result<Option<Peripheral>, BleError>
where
    S: Stream<Item = CentralEvent> + Unpin,
{
    for peripheral in central.peripherals().await? {
        if peripheral.address() == address {
            return Ok(Some(peripheral));
        }
    }

    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        let remaining = deadline - tokio::time::Instant::now();
        match tokio::time::timeout(remaining, events.next()).await {
            Ok(Some(CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id))) => {
                let Ok(peripheral) = central.peripheral(&id).await else {
                    continue;
                };
                if peripheral.address() == address {
                    return Ok(Some(peripheral));
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
    Ok(None)
}

impl LightConnector for HueBleConnector {
    type Light = HueBleLight;

    async fn connect(&self) -> Result<HueBleLight, DeviceError> {
        self.open().await.map_err(|err| {
            tracing::warn!(%err, address = %self.config.address, "failed to connect to Hue light");
            err.into_device()
        })
    }
}

/// A connected Hue light.
#[derive(Debug, Clone)]
pub struct HueBleLight {
    peripheral: Peripheral,
    power: Characteristic,
    brightness: Characteristic,
    temperature: Characteristic,
    colour: Characteristic,
}

impl HueBleLight {
    fn new(peripheral: Peripheral) -> Result<Self, BleError> {
        Ok(Self {
            power: gatt::find_characteristic(&peripheral, gatt::POWER_CHAR)?,
            brightness: gatt::find_characteristic(&peripheral, gatt::BRIGHTNESS_CHAR)?,
            temperature: gatt::find_characteristic(&peripheral, gatt::TEMPERATURE_CHAR)?,
            colour: gatt::find_characteristic(&peripheral, gatt::COLOUR_CHAR)?,
            peripheral,
        })
    }

    async fn write(&self, characteristic: &Characteristic, payload: &[u8]) -> Result<(), DeviceError> {
        self.peripheral
            .write(characteristic, payload, WriteType::WithResponse)
            .await
            .map_err(|err| {
                tracing::debug!(%err, uuid = %characteristic.uuid, "GATT write failed");
                BleError::from(err).into_device()
            })
    }
}

impl Light for HueBleLight {
    async fn set_power(&self, on: bool) -> Result<(), DeviceError> {
        self.write(&self.power, &gatt::power_payload(on)).await
    }

    async fn set_brightness(&self, brightness: Brightness) -> Result<(), DeviceError> {
        self.write(&self.brightness, &gatt::brightness_payload(brightness))
            .await
    }

    async fn set_colour_xy(&self, colour: ColourXY) -> Result<(), DeviceError> {
        self.write(&self.colour, &gatt::colour_payload(colour)).await
    }

    async fn set_colour_temperature(&self, temperature: Mireds) -> Result<(), DeviceError> {
        self.write(&self.temperature, &gatt::temperature_payload(temperature))
            .await
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        self.peripheral
            .disconnect()
            .await
            .map_err(|err| BleError::from(err).into_device())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_reject_malformed_address_before_scanning() {
        let connector = HueBleConnector::new(HueBleConfig {
            address: "not-a-mac".into(),
            ..HueBleConfig::default()
        });

        let err = connector.open().await.unwrap_err();

        assert!(matches!(err, BleError::InvalidAddress(address) if address == "not-a-mac"));
    }

    #[tokio::test]
    async fn should_surface_malformed_address_as_transport_error() {
        let connector = HueBleConnector::new(HueBleConfig::default());

        let err = connector.connect().await.unwrap_err();

        assert!(matches!(err, DeviceError::Transport(_)));
    }
}
