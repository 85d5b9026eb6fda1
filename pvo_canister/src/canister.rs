// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The canister variant a service instance runs, and its upgrade state.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use pvo_core::manager::adapters::LedgerQuery;
use serde::{Deserialize, Serialize};

use crate::{
    marketplace::{Marketplace, MarketplaceState},
    registry::{DocumentRegistry, InitPayload, RegistryState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CanisterVariant {
    Registry,
    Marketplace,
}

pub enum Canister<L> {
    Registry(Arc<DocumentRegistry<L>>),
    Marketplace(Arc<Marketplace<L>>),
}

impl<L> Clone for Canister<L> {
    fn clone(&self) -> Self {
        match self {
            Canister::Registry(registry) => Canister::Registry(Arc::clone(registry)),
            Canister::Marketplace(marketplace) => Canister::Marketplace(Arc::clone(marketplace)),
        }
    }
}

/// State written on shutdown and read back on the next start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum CanisterState {
    Registry(RegistryState),
    Marketplace(MarketplaceState),
}

impl<L> Canister<L> {
    pub fn variant(&self) -> CanisterVariant {
        match self {
            Canister::Registry(_) => CanisterVariant::Registry,
            Canister::Marketplace(_) => CanisterVariant::Marketplace,
        }
    }
}

impl<L> Canister<L>
where
    L: LedgerQuery + Send + Sync,
{
    /// Initialises a fresh canister. The registry needs its fees.
    pub fn init(&self, fees: Option<InitPayload>) -> Result<()> {
        match self {
            Canister::Registry(registry) => {
                let fees = fees.context("the registry needs an add document fee and a verify document fee")?;
                registry.init(fees)?;
            }
            Canister::Marketplace(marketplace) => marketplace.init()?,
        }
        Ok(())
    }

    pub async fn pre_upgrade(&self) -> Result<CanisterState> {
        Ok(match self {
            Canister::Registry(registry) => CanisterState::Registry(registry.pre_upgrade().await?),
            Canister::Marketplace(marketplace) => {
                CanisterState::Marketplace(marketplace.pre_upgrade().await?)
            }
        })
    }

    pub async fn post_upgrade(&self, fees: Option<InitPayload>, state: CanisterState) -> Result<()> {
        match (self, state) {
            (Canister::Registry(registry), CanisterState::Registry(state)) => {
                let fees = fees.context("the registry needs an add document fee and a verify document fee")?;
                registry.post_upgrade(fees, state).await?;
            }
            (Canister::Marketplace(marketplace), CanisterState::Marketplace(state)) => {
                marketplace.post_upgrade(state).await?;
            }
            (canister, _) => anyhow::bail!(
                "saved state does not belong to a {} canister",
                canister.variant()
            ),
        }
        Ok(())
    }

    /// Restores the state saved at `path` if the file exists, initialises a
    /// fresh canister otherwise.
    pub async fn start(&self, fees: Option<InitPayload>, path: Option<&Path>) -> Result<()> {
        match path.filter(|path| path.exists()) {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("failed to read state file {}", path.display()))?;
                let state: CanisterState = serde_json::from_slice(&bytes)
                    .with_context(|| format!("failed to parse state file {}", path.display()))?;
                self.post_upgrade(fees, state).await?;
                log::info!("State restored from {}", path.display());
            }
            None => self.init(fees)?,
        }
        Ok(())
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let state = self.pre_upgrade().await?;
        std::fs::write(path, serde_json::to_vec_pretty(&state)?)
            .with_context(|| format!("failed to write state file {}", path.display()))?;
        log::info!("State saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pvo_core::{config::ReservationConfig, manager::context::memory::InMemoryLedger};
    use pvo_ledger::Principal;

    use super::*;

    fn registry() -> Canister<InMemoryLedger> {
        Canister::Registry(Arc::new(DocumentRegistry::new(
            &ReservationConfig::new(Principal::anonymous()),
            InMemoryLedger::new(),
        )))
    }

    fn marketplace() -> Canister<InMemoryLedger> {
        Canister::Marketplace(Arc::new(Marketplace::new(
            &ReservationConfig::new(Principal::anonymous()),
            InMemoryLedger::new(),
        )))
    }

    #[test]
    fn registry_needs_fees() {
        assert!(registry().init(None).is_err());
        assert!(registry()
            .init(Some(InitPayload {
                add_doc_fee: 1,
                verify_doc_fee: 1
            }))
            .is_ok());
        assert!(marketplace().init(None).is_ok());
    }

    #[tokio::test]
    async fn state_file_round_trip() {
        let path = std::env::temp_dir().join(format!("pvo-state-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let canister = marketplace();
        canister.start(None, Some(&path)).await.unwrap();
        if let Canister::Marketplace(marketplace) = &canister {
            marketplace
                .add_product(
                    &Principal::anonymous(),
                    crate::marketplace::ProductPayload {
                        title: "Lamp".to_string(),
                        description: String::new(),
                        location: String::new(),
                        attachment_url: String::new(),
                        price: 5,
                    },
                )
                .unwrap();
        }
        canister.save(&path).await.unwrap();

        let restarted = marketplace();
        restarted.start(None, Some(&path)).await.unwrap();
        match &restarted {
            Canister::Marketplace(marketplace) => assert_eq!(marketplace.get_products().len(), 1),
            Canister::Registry(_) => unreachable!(),
        }

        // a registry refuses marketplace state
        assert!(registry()
            .start(
                Some(InitPayload {
                    add_doc_fee: 1,
                    verify_doc_fee: 1
                }),
                Some(&path)
            )
            .await
            .is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
