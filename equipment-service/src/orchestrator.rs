use std::sync::Arc;

use dashmap::DashMap;
use shared::*;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::{check_availability, validate_window, ConflictPolicy};
use crate::store::*;

type Result<T> = std::result::Result<T, ReservationError>;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub policy: ConflictPolicy,
    /// Hold a per-(tenant, item) lock from the conflict read until the write.
    pub serialize_admission: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            policy: ConflictPolicy::default(),
            serialize_admission: true,
        }
    }
}

/// In-process admission locks keyed by (tenant, item). An entry lives only
/// while some request holds or waits on it.
#[derive(Default)]
struct AdmissionLocks {
    locks: DashMap<(Uuid, Uuid), Arc<Mutex<()>>>,
}

impl AdmissionLocks {
    /// Locks are taken in key order so overlapping batches cannot deadlock.
    async fn acquire(&self, mut keys: Vec<(Uuid, Uuid)>) -> AdmissionPermit<'_> {
        keys.sort_unstable();
        keys.dedup();
        let mut held = Vec::with_capacity(keys.len());
        for key in keys {
            let lock = self.locks.entry(key).or_default().clone();
            held.push((key, lock.lock_owned().await));
        }
        AdmissionPermit { locks: self, held }
    }
}

/// Releases its locks on drop and forgets keys nobody else is using.
struct AdmissionPermit<'a> {
    locks: &'a AdmissionLocks,
    held: Vec<((Uuid, Uuid), OwnedMutexGuard<()>)>,
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        for (key, guard) in self.held.drain(..) {
            drop(guard);
            // the map's own reference is the last one when no request is queued
            self.locks.locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

/// Sole entry point for writing reservations.
pub struct ReservationOrchestrator {
    projects: Arc<dyn ProjectLookup>,
    inventory: Arc<dyn InventoryLookup>,
    reservations: Arc<dyn ReservationStore>,
    config: OrchestratorConfig,
    admission: AdmissionLocks,
}

impl ReservationOrchestrator {
    pub fn new(
        projects: Arc<dyn ProjectLookup>,
        inventory: Arc<dyn InventoryLookup>,
        reservations: Arc<dyn ReservationStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            projects,
            inventory,
            reservations,
            config,
            admission: AdmissionLocks::default(),
        }
    }

    pub fn from_store<S: Store + 'static>(store: Arc<S>, config: OrchestratorConfig) -> Self {
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub async fn create_reservation(&self, tenant_id: Uuid, candidate: NewReservation) -> Result<Reservation> {
        let project = self.project(tenant_id, candidate.project_id).await?;
        let _permit = self.admit(tenant_id, vec![candidate.item_id]).await;

        let (from, to) = self.config.policy.window(&candidate);
        let (conflicting, stock) = futures::try_join!(
            self.reservations.reservations_in_window(tenant_id, candidate.item_id, from, to),
            self.stock(tenant_id, candidate.item_id),
        )?;

        if let Err(rejection) = check_availability(&candidate, project.date, &conflicting, stock, self.config.policy) {
            warn!("Reservation of item {} rejected: {:?}", candidate.item_id, rejection);
            return Err(rejection.into());
        }

        let reservation = self
            .reservations
            .insert_reservation(Reservation::new(tenant_id, candidate))
            .await?;
        info!(
            "Reservation {} created for item {} ({} to {})",
            reservation.id, reservation.item_id, reservation.check_in, reservation.check_out
        );
        Ok(reservation)
    }

    /// Validates every candidate before writing any of them. Candidates
    /// accepted earlier in the batch count against later ones.
    pub async fn create_reservations(&self, tenant_id: Uuid, candidates: Vec<NewReservation>) -> Result<BatchPayload> {
        if candidates.is_empty() {
            return Ok(BatchPayload { count: 0 });
        }

        let _permit = self
            .admit(tenant_id, candidates.iter().map(|c| c.item_id).collect())
            .await;

        let mut accepted: Vec<Reservation> = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.into_iter().enumerate() {
            let project = self.project(tenant_id, candidate.project_id).await?;
            let (from, to) = self.config.policy.window(&candidate);
            let (mut conflicting, stock) = futures::try_join!(
                self.reservations.reservations_in_window(tenant_id, candidate.item_id, from, to),
                self.stock(tenant_id, candidate.item_id),
            )?;
            conflicting.extend(
                accepted
                    .iter()
                    .filter(|r| r.item_id == candidate.item_id && r.overlaps(from, to))
                    .cloned(),
            );

            if let Err(rejection) = check_availability(&candidate, project.date, &conflicting, stock, self.config.policy)
            {
                warn!("Reservation batch rejected at entry {}: {:?}", index, rejection);
                return Err(rejection.into());
            }
            accepted.push(Reservation::new(tenant_id, candidate));
        }

        let count = self.reservations.insert_reservations(accepted).await?;
        info!("{} reservations created for tenant {}", count, tenant_id);
        Ok(BatchPayload { count })
    }

    pub async fn get_reservation_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Reservation>> {
        Ok(self.reservations.reservation_by_id(tenant_id, id).await?)
    }

    pub async fn get_reservations(&self, tenant_id: Uuid, sort: ReservationSort) -> Result<Vec<Reservation>> {
        Ok(self.reservations.reservations_for_tenant(tenant_id, sort).await?)
    }

    pub async fn get_reservations_by_project(&self, tenant_id: Uuid, project_id: Uuid) -> Result<Vec<Reservation>> {
        Ok(self.reservations.reservations_by_project(tenant_id, project_id).await?)
    }

    /// Full-record update. Capacity is not re-checked, so an edit may leave
    /// an item over-allocated; a reversed window is still refused.
    pub async fn update_reservation_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: ReservationUpdate,
    ) -> Result<Reservation> {
        validate_window(update.check_in, update.check_out)?;
        let updated = self
            .reservations
            .update_reservation(tenant_id, id, update)
            .await?
            .ok_or_else(|| ReservationError::not_found(Entity::Reservation, id))?;
        info!("Reservation {} updated", id);
        Ok(updated)
    }

    /// Bulk form of [`Self::update_reservation_by_id`]: every entry is applied
    /// or none is.
    pub async fn update_reservations(
        &self,
        tenant_id: Uuid,
        entries: Vec<ReservationUpdateEntry>,
    ) -> Result<BatchPayload> {
        for entry in &entries {
            validate_window(entry.update.check_in, entry.update.check_out)?;
        }
        match self.reservations.update_reservations(tenant_id, entries).await? {
            BulkUpdate::Updated(count) => {
                info!("{} reservations updated for tenant {}", count, tenant_id);
                Ok(BatchPayload { count })
            }
            BulkUpdate::Missing(id) => Err(ReservationError::not_found(Entity::Reservation, id)),
        }
    }

    pub async fn delete_reservation_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Reservation> {
        let deleted = self
            .reservations
            .delete_reservation(tenant_id, id)
            .await?
            .ok_or_else(|| ReservationError::not_found(Entity::Reservation, id))?;
        info!("Reservation {} deleted", id);
        Ok(deleted)
    }

    pub async fn delete_reservations_for_tenant(&self, tenant_id: Uuid) -> Result<BatchPayload> {
        let count = self.reservations.delete_reservations_for_tenant(tenant_id).await?;
        info!("{} reservations deleted for tenant {}", count, tenant_id);
        Ok(BatchPayload { count })
    }

    async fn project(&self, tenant_id: Uuid, project_id: Uuid) -> Result<Project> {
        self.projects
            .project_by_id(tenant_id, project_id)
            .await?
            .ok_or_else(|| ReservationError::not_found(Entity::Project, project_id))
    }

    /// A missing item has no units to hand out.
    async fn stock(&self, tenant_id: Uuid, item_id: Uuid) -> StoreResult<u32> {
        let item = self.inventory.inventory_item_by_id(tenant_id, item_id).await?;
        Ok(item.map_or(0, |i| i.stock))
    }

    async fn admit(&self, tenant_id: Uuid, items: Vec<Uuid>) -> Option<AdmissionPermit<'_>> {
        if !self.config.serialize_admission {
            return None;
        }
        let keys = items.into_iter().map(|item_id| (tenant_id, item_id)).collect();
        Some(self.admission.acquire(keys).await)
    }
}
