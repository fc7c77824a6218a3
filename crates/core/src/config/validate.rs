use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::arr::AppKind;

/// Longest accepted cooldown: 100 years.
pub const MAX_TTL_HOURS: u32 = 100 * 365 * 24;

/// Validate configuration
/// Currently validates:
/// - `state.ttl_hours` is between 1 and [`MAX_TTL_HOURS`]
/// - `http.timeout_secs` is not 0
/// - instance names are unique per managed-system type
///
/// Instances without `url`/`api_key` pass; the hunt skips them with a warning.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.state.ttl_hours == 0 {
        return Err(ConfigError::ValidationError(
            "state.ttl_hours cannot be 0".to_string(),
        ));
    }

    if config.state.ttl_hours > MAX_TTL_HOURS {
        return Err(ConfigError::ValidationError(format!(
            "state.ttl_hours cannot exceed {} (got {})",
            MAX_TTL_HOURS, config.state.ttl_hours
        )));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    for app in AppKind::ALL {
        let mut seen = HashSet::new();
        for instance in config.instances(app) {
            let name = instance.display_name(app);
            if !seen.insert(name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate {} instance name: {}",
                    app, name
                )));
            }
        }
    }

    Ok(())
}
