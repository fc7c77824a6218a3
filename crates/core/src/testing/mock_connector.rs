//! Mock connector handing out [`MockArr`] handles by instance name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::MockArr;
use crate::arr::{AppKind, ArrApi, ArrConnector, ArrError};
use crate::config::{HttpConfig, InstanceConfig};

/// Mock implementation of [`ArrConnector`].
///
/// Instances are looked up by `(app, display name)`. Connecting to an
/// unregistered instance fails like an invalid URL would.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    instances: HashMap<(AppKind, String), MockArr>,
    connects: Arc<Mutex<Vec<(AppKind, String)>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mock under an instance name.
    pub fn with_instance(mut self, app: AppKind, name: &str, mock: MockArr) -> Self {
        self.instances.insert((app, name.to_string()), mock);
        self
    }

    /// Instances connected to, in order.
    pub fn recorded_connects(&self) -> Vec<(AppKind, String)> {
        self.connects.lock().unwrap().clone()
    }
}

impl ArrConnector for MockConnector {
    fn connect(
        &self,
        app: AppKind,
        instance: &InstanceConfig,
        _http: &HttpConfig,
    ) -> Result<Box<dyn ArrApi>, ArrError> {
        let name = instance.display_name(app).to_string();
        self.connects.lock().unwrap().push((app, name.clone()));

        match self.instances.get(&(app, name)) {
            Some(mock) => Ok(Box::new(mock.clone())),
            None => Err(ArrError::InvalidConfig(format!(
                "no mock registered for {}",
                instance.url
            ))),
        }
    }
}
