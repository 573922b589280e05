//! Dataset access port trait.

use crate::domain::dataset::RawDataset;
use crate::domain::error::ExplorerError;

pub trait DataPort {
    /// Load the whole per-country dataset in source order.
    fn fetch_dataset(&self) -> Result<RawDataset, ExplorerError>;

    /// Human-readable origin of the data, for logging.
    fn describe(&self) -> String;
}
