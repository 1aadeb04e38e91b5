//! Virtual connector: "discovers" a shared [`VirtualLight`].

use std::sync::Arc;
use std::time::Duration;

use hueflow_app::ports::LightConnector;
use hueflow_domain::error::DeviceError;

use crate::light::VirtualLight;

/// Hands out the same [`VirtualLight`] on every connect, so the caller can
/// keep a clone and inspect what the engine did.
#[derive(Debug, Clone, Default)]
pub struct VirtualConnector {
    light: Option<Arc<VirtualLight>>,
    delay: Duration,
}

impl VirtualConnector {
    #[must_use]
    pub fn new(light: Arc<VirtualLight>) -> Self {
        Self {
            light: Some(light),
            delay: Duration::ZERO,
        }
    }

    /// A connector whose light is never found.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Take `delay` to connect, like a scan would.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl LightConnector for VirtualConnector {
    type Light = Arc<VirtualLight>;

    async fn connect(&self) -> Result<Arc<VirtualLight>, DeviceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let light = self.light.clone().ok_or_else(|| DeviceError::NotFound {
            address: "virtual".into(),
        })?;
        tracing::info!("virtual light connected");
        Ok(light)
    }
}

#[cfg(test)]
mod tests {
    use hueflow_app::ports::Light;

    use super::*;

    #[tokio::test]
    async fn should_hand_out_shared_light() {
        let light = Arc::new(VirtualLight::default());
        let connector = VirtualConnector::new(Arc::clone(&light));

        let connected = connector.connect().await.unwrap();
        connected.set_power(true).await.unwrap();

        assert!(light.snapshot().on);
    }

    #[tokio::test]
    async fn should_report_unreachable_light_as_not_found() {
        let err = VirtualConnector::unreachable().connect().await.unwrap_err();
        assert!(matches!(err, DeviceError::NotFound { address } if address == "virtual"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_for_connect_delay() {
        let connector = VirtualConnector::new(Arc::default()).with_delay(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        connector.connect().await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
