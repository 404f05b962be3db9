mod diff;
mod id;
mod inventory;
mod snapshot;

pub use diff::Diff;
pub use id::{CurrencyId, ItemId};
pub use inventory::{Inventory, Wallet};
pub use snapshot::Snapshot;
