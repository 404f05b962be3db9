use std::fmt;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use tracing::{info, warn};

use super::wire;
use super::{BuildError, FailedFetch};
use crate::api::{decode, Fetch, FetchError, Resource};
use crate::clock::{Clock, SystemClock};
use crate::credentials::ApiKey;
use crate::models::{Inventory, Snapshot, Wallet};

/// What one resource fetch contributes to the snapshot.
enum Contribution {
    Items(Inventory),
    Currencies(Wallet),
}

/// Captures fully populated account snapshots.
///
/// Owns no connection itself; all remote I/O goes through the shared
/// [`Fetch`] implementation, whose concurrency gate bounds the fan-out.
pub struct SnapshotBuilder {
    fetcher: Arc<dyn Fetch>,
    clock: Arc<dyn Clock>,
}

impl SnapshotBuilder {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Capture a snapshot of the whole account.
    ///
    /// The character list is fetched first and fans out into one fetch per
    /// character inventory and equipment, alongside the account-level
    /// resources. All fetches are joined before anything is observable:
    /// if any resource fails, the build fails with the full list of failed
    /// resources and no snapshot is produced. Dropping the returned future
    /// cancels the in-flight fetches.
    ///
    /// `captured_at` is recorded at the start of the build, so the snapshot
    /// reads "as of roughly this instant" even though the individual
    /// fetches complete afterwards in any order.
    pub async fn build(&self, key: &ApiKey) -> Result<Snapshot, BuildError> {
        let captured_at = self.clock.now();

        let characters = match self.characters(key).await {
            Ok(names) => names,
            Err(error) => {
                return Err(BuildError::PartialFailure {
                    failed: vec![FailedFetch {
                        resource: Resource::Characters,
                        error,
                    }],
                })
            }
        };

        let mut fetches: Vec<BoxFuture<'_, (Resource, Result<Contribution, FetchError>)>> = vec![
            Box::pin(self.fetch(Resource::Wallet, key)),
            Box::pin(self.fetch(Resource::Bank, key)),
            Box::pin(self.fetch(Resource::Materials, key)),
            Box::pin(self.fetch(Resource::SharedInventory, key)),
        ];
        for name in &characters {
            fetches.push(Box::pin(
                self.fetch(Resource::CharacterInventory(name.clone()), key),
            ));
            fetches.push(Box::pin(
                self.fetch(Resource::CharacterEquipment(name.clone()), key),
            ));
        }

        let outcomes = join_all(fetches).await;

        let mut items = Inventory::new();
        let mut currencies = Wallet::new();
        let mut failed = Vec::new();
        for (resource, outcome) in outcomes {
            match outcome {
                Ok(Contribution::Items(inventory)) => items.merge(inventory),
                Ok(Contribution::Currencies(wallet)) => currencies.merge(wallet),
                Err(error) => failed.push(FailedFetch { resource, error }),
            }
        }

        if !failed.is_empty() {
            warn!(failed = failed.len(), "aborting snapshot capture");
            return Err(BuildError::PartialFailure { failed });
        }

        info!(
            characters = characters.len(),
            distinct_items = items.len(),
            currencies = currencies.len(),
            "snapshot captured"
        );
        Ok(Snapshot::new(captured_at, currencies, items))
    }

    async fn characters(&self, key: &ApiKey) -> Result<Vec<String>, FetchError> {
        let resource = Resource::Characters;
        let value = self.fetcher.get(&resource, Some(key)).await?;
        decode(&resource, value)
    }

    async fn fetch(
        &self,
        resource: Resource,
        key: &ApiKey,
    ) -> (Resource, Result<Contribution, FetchError>) {
        let result = self.contribution(&resource, key).await;
        (resource, result)
    }

    async fn contribution(
        &self,
        resource: &Resource,
        key: &ApiKey,
    ) -> Result<Contribution, FetchError> {
        let value = self.fetcher.get(resource, Some(key)).await?;
        match resource {
            Resource::Wallet => {
                let entries: Vec<wire::WalletEntry> = decode(resource, value)?;
                Ok(Contribution::Currencies(wire::entries_to_wallet(entries)))
            }
            Resource::Bank | Resource::Materials | Resource::SharedInventory => {
                let slots: Vec<Option<wire::Slot>> = decode(resource, value)?;
                let inventory =
                    wire::slots_to_inventory(slots).map_err(|err| malformed(resource, err))?;
                Ok(Contribution::Items(inventory))
            }
            Resource::CharacterInventory(_) => {
                let bags: wire::CharacterBags = decode(resource, value)?;
                let inventory = bags
                    .into_inventory()
                    .map_err(|err| malformed(resource, err))?;
                Ok(Contribution::Items(inventory))
            }
            Resource::CharacterEquipment(_) => {
                let equipment: wire::CharacterEquipment = decode(resource, value)?;
                Ok(Contribution::Items(equipment.into_inventory()))
            }
            Resource::TokenInfo | Resource::Characters | Resource::Prices(_) => {
                unreachable!("not a snapshot resource")
            }
        }
    }
}

fn malformed(resource: &Resource, err: impl fmt::Display) -> FetchError {
    FetchError::Malformed {
        resource: resource.to_string(),
        reason: err.to_string(),
    }
}
