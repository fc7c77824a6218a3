pub mod arr;
pub mod config;
pub mod hunt;
pub mod ledger;
pub mod testing;

pub use arr::{AppKind, ArrApi, ArrClient, ArrConnector, ArrError, HttpConnector, HuntKind};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ConfigFormat,
    SanitizedConfig,
};
pub use hunt::{CycleReport, HuntError, HuntOrchestrator, Sampler};
pub use ledger::{LedgerError, SearchLedger, SqliteLedger};
