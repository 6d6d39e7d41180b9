use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use shared::*;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::*;

#[derive(Default)]
struct Tables {
    companies: HashMap<Uuid, Company>,
    projects: HashMap<Uuid, Project>,
    inventory: HashMap<Uuid, InventoryItem>,
    reservations: Vec<Reservation>,
}

/// Fixture data for a memory-backed process: the records that other
/// subsystems would own in a real deployment.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

/// Thread-safe in-memory store. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_seed(seed: Seed) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write().await;
            tables.companies.extend(seed.companies.into_iter().map(|c| (c.id, c)));
            tables.projects.extend(seed.projects.into_iter().map(|p| (p.id, p)));
            tables.inventory.extend(seed.inventory.into_iter().map(|i| (i.id, i)));
        }
        store
    }

    pub async fn insert_company(&self, company: Company) {
        self.tables.write().await.companies.insert(company.id, company);
    }

    pub async fn insert_project(&self, project: Project) {
        self.tables.write().await.projects.insert(project.id, project);
    }

    pub async fn insert_inventory_item(&self, item: InventoryItem) {
        self.tables.write().await.inventory.insert(item.id, item);
    }

    pub async fn reservation_count(&self) -> usize {
        self.tables.read().await.reservations.len()
    }
}

#[async_trait]
impl ProjectLookup for MemoryStore {
    async fn project_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.get(&id).filter(|p| p.tenant_id == tenant_id).cloned())
    }
}

#[async_trait]
impl InventoryLookup for MemoryStore {
    async fn inventory_item_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<InventoryItem>> {
        let tables = self.tables.read().await;
        Ok(tables.inventory.get(&id).filter(|i| i.tenant_id == tenant_id).cloned())
    }
}

#[async_trait]
impl CompanyLookup for MemoryStore {
    async fn company_for_user(&self, user_id: Uuid) -> StoreResult<Option<Company>> {
        let tables = self.tables.read().await;
        Ok(tables.companies.values().find(|c| c.user_id == user_id).cloned())
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn reservations_in_window(
        &self,
        tenant_id: Uuid,
        item_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.item_id == item_id && r.overlaps(from, to))
            .cloned()
            .collect())
    }

    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation> {
        let mut tables = self.tables.write().await;
        if tables.reservations.iter().any(|r| r.id == reservation.id) {
            return Err(StoreError::UniqueViolation);
        }
        tables.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn insert_reservations(&self, reservations: Vec<Reservation>) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        for (i, reservation) in reservations.iter().enumerate() {
            let duplicate = tables.reservations.iter().any(|r| r.id == reservation.id)
                || reservations[..i].iter().any(|r| r.id == reservation.id);
            if duplicate {
                return Err(StoreError::UniqueViolation);
            }
        }
        let count = reservations.len();
        tables.reservations.extend(reservations);
        Ok(count)
    }

    async fn reservation_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Reservation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reservations
            .iter()
            .find(|r| r.id == id && r.tenant_id == tenant_id)
            .cloned())
    }

    async fn reservations_for_tenant(&self, tenant_id: Uuid, sort: ReservationSort) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        match sort {
            ReservationSort::CheckIn => found.sort_by_key(|r| (r.check_in, r.id)),
            ReservationSort::CheckOut => found.sort_by_key(|r| (r.check_out, r.id)),
            ReservationSort::ProjectId => found.sort_by_key(|r| (r.project_id, r.id)),
            ReservationSort::ItemId => found.sort_by_key(|r| (r.item_id, r.id)),
        }
        Ok(found)
    }

    async fn reservations_by_project(&self, tenant_id: Uuid, project_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.project_id == project_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.check_in);
        Ok(found)
    }

    async fn update_reservation(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: ReservationUpdate,
    ) -> StoreResult<Option<Reservation>> {
        let mut tables = self.tables.write().await;
        let Some(reservation) = tables
            .reservations
            .iter_mut()
            .find(|r| r.id == id && r.tenant_id == tenant_id)
        else {
            return Ok(None);
        };
        reservation.apply(update);
        Ok(Some(reservation.clone()))
    }

    async fn update_reservations(
        &self,
        tenant_id: Uuid,
        entries: Vec<ReservationUpdateEntry>,
    ) -> StoreResult<BulkUpdate> {
        let mut tables = self.tables.write().await;
        let mut positions = Vec::with_capacity(entries.len());
        for entry in &entries {
            let position = tables
                .reservations
                .iter()
                .position(|r| r.id == entry.id && r.tenant_id == tenant_id);
            match position {
                Some(i) => positions.push(i),
                None => return Ok(BulkUpdate::Missing(entry.id)),
            }
        }
        let count = entries.len();
        for (i, entry) in positions.into_iter().zip(entries) {
            tables.reservations[i].apply(entry.update);
        }
        Ok(BulkUpdate::Updated(count))
    }

    async fn delete_reservation(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Reservation>> {
        let mut tables = self.tables.write().await;
        let position = tables
            .reservations
            .iter()
            .position(|r| r.id == id && r.tenant_id == tenant_id);
        Ok(position.map(|i| tables.reservations.remove(i)))
    }

    async fn delete_reservations_for_tenant(&self, tenant_id: Uuid) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.reservations.len();
        tables.reservations.retain(|r| r.tenant_id != tenant_id);
        Ok(before - tables.reservations.len())
    }
}
