//! Cached flat and tenant-availability lists.
//!
//! Both lists are copies of server state. They are never patched locally:
//! after any mutation that could affect them the board refetches both
//! wholesale, and a failed refresh keeps the previous copies intact.

use tracing::{debug, info};

use rdk_api::{ApiError, FlatsApi};
use rdk_schemas::{AccountType, Flat, SessionUser, Tenant};

use crate::assignment::DialogEvent;

/// Which flat listing the board shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatScope {
    /// Every listed flat (tenants and anonymous viewers).
    All,
    /// Only flats owned by this owner id.
    Owner(String),
}

impl FlatScope {
    pub fn for_user(user: &SessionUser) -> Self {
        match user.account_type {
            AccountType::Owner => FlatScope::Owner(user.unique_id.clone()),
            AccountType::Tenant | AccountType::Admin => FlatScope::All,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlatBoard {
    scope: FlatScope,
    flats: Vec<Flat>,
    available_tenants: Vec<Tenant>,
    refreshes: u64,
}

impl FlatBoard {
    pub fn new(scope: FlatScope) -> Self {
        Self {
            scope,
            flats: Vec::new(),
            available_tenants: Vec::new(),
            refreshes: 0,
        }
    }

    pub fn scope(&self) -> &FlatScope {
        &self.scope
    }

    pub fn flats(&self) -> &[Flat] {
        &self.flats
    }

    pub fn flat(&self, flat_id: &str) -> Option<&Flat> {
        self.flats.iter().find(|f| f.flat_unique_id == flat_id)
    }

    pub fn vacant_flats(&self) -> impl Iterator<Item = &Flat> {
        self.flats.iter().filter(|f| !f.is_rented)
    }

    pub fn rented_flats(&self) -> impl Iterator<Item = &Flat> {
        self.flats.iter().filter(|f| f.is_rented)
    }

    /// Tenants currently free to be assigned. Only fetched for owners.
    pub fn available_tenants(&self) -> &[Tenant] {
        &self.available_tenants
    }

    /// Number of successful refreshes.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    /// Refetch the flat list (and, for owners, tenant availability).
    pub async fn refresh<A>(&mut self, api: &A) -> Result<(), ApiError>
    where
        A: FlatsApi + ?Sized,
    {
        let (flats, tenants) = match &self.scope {
            FlatScope::All => (api.list_flats().await?, Vec::new()),
            FlatScope::Owner(owner_id) => {
                let flats = api.owner_flats(owner_id).await?;
                let tenants = api.available_tenants().await?;
                (flats, tenants)
            }
        };
        self.flats = flats;
        self.available_tenants = tenants;
        self.refreshes += 1;
        debug!(
            flats = self.flats.len(),
            available_tenants = self.available_tenants.len(),
            "flat board refreshed"
        );
        Ok(())
    }

    /// Refresh when `event` settled a mutation. Returns whether it refetched.
    pub async fn apply_settlement<A>(
        &mut self,
        api: &A,
        event: &DialogEvent,
    ) -> Result<bool, ApiError>
    where
        A: FlatsApi + ?Sized,
    {
        if !event.requires_refresh() {
            return Ok(false);
        }
        info!("mutation settled; refetching flat board");
        self.refresh(api).await?;
        Ok(true)
    }
}
