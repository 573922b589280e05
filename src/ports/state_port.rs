//! Dashboard state persistence port trait.

use crate::domain::error::ExplorerError;
use crate::domain::state::DashboardState;

pub trait StatePort {
    /// Stored state, or the default state when nothing has been stored yet.
    fn load(&self) -> Result<DashboardState, ExplorerError>;

    fn save(&self, state: &DashboardState) -> Result<(), ExplorerError>;
}
