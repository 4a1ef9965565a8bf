pub mod dialog;
pub mod form;
pub mod gateway;
pub mod ranges;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{CepRangeEntry, Notification, Unit};
pub use crate::domain::ports::{Backend, BackendConfig, Notifier};
pub use crate::utils::error::Result;
