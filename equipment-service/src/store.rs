use async_trait::async_trait;
use chrono::NaiveDate;
use shared::*;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a bulk update. Nothing is written unless every id exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkUpdate {
    Updated(usize),
    Missing(Uuid),
}

#[async_trait]
pub trait ProjectLookup: Send + Sync {
    async fn project_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Project>>;
}

#[async_trait]
pub trait InventoryLookup: Send + Sync {
    async fn inventory_item_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<InventoryItem>>;
}

#[async_trait]
pub trait CompanyLookup: Send + Sync {
    async fn company_for_user(&self, user_id: Uuid) -> StoreResult<Option<Company>>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Reservations of `item_id` whose window shares at least one day with
    /// `[from, to]`. With `from == to` this is the set of reservations
    /// covering that single date.
    async fn reservations_in_window(
        &self,
        tenant_id: Uuid,
        item_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Reservation>>;

    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation>;

    /// Inserts every record or none of them.
    async fn insert_reservations(&self, reservations: Vec<Reservation>) -> StoreResult<usize>;

    async fn reservation_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Reservation>>;

    async fn reservations_for_tenant(&self, tenant_id: Uuid, sort: ReservationSort) -> StoreResult<Vec<Reservation>>;

    async fn reservations_by_project(&self, tenant_id: Uuid, project_id: Uuid) -> StoreResult<Vec<Reservation>>;

    async fn update_reservation(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: ReservationUpdate,
    ) -> StoreResult<Option<Reservation>>;

    async fn update_reservations(
        &self,
        tenant_id: Uuid,
        entries: Vec<ReservationUpdateEntry>,
    ) -> StoreResult<BulkUpdate>;

    async fn delete_reservation(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Reservation>>;

    async fn delete_reservations_for_tenant(&self, tenant_id: Uuid) -> StoreResult<usize>;
}

/// Everything a single backend provides.
pub trait Store: ProjectLookup + InventoryLookup + CompanyLookup + ReservationStore {}

impl<T> Store for T where T: ProjectLookup + InventoryLookup + CompanyLookup + ReservationStore {}
