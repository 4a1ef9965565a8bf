pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::postgrest::PostgrestBackend;
pub use config::toml_config::AdminConfig;
pub use crate::core::{
    dialog::{SaveStatus, UnitDialog},
    form::UnitForm,
    gateway::{PersistenceGateway, SaveOutcome},
    ranges::{BlockedCepList, CepRangeList, RangeField},
};
pub use domain::model::{CepRangeEntry, FieldValue, Notification, RangeKind, Unit, UnitField};
pub use utils::error::{Result, UnitError};
