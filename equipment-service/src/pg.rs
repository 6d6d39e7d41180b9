use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::PoolError;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::*;
use uuid::Uuid;

use crate::models::*;
use crate::schema::*;
use crate::store::*;

pub type DbPool = Pool<AsyncPgConnection>;

/// Postgres-backed store. Every query is filtered by `company_id`.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StoreResult<PooledConnection<'_, AsyncPgConnection>> {
        self.pool.get().await.map_err(pool_error)
    }
}

fn pool_error(e: bb8::RunError<PoolError>) -> StoreError {
    StoreError::Connection(e.to_string())
}

/// Rolls a bulk update back, either because an id is unknown or because the
/// database failed.
enum BulkAbort {
    Missing(Uuid),
    Store(StoreError),
}

impl From<diesel::result::Error> for BulkAbort {
    fn from(e: diesel::result::Error) -> Self {
        BulkAbort::Store(e.into())
    }
}

#[async_trait]
impl ProjectLookup for PgStore {
    async fn project_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Project>> {
        let mut conn = self.conn().await?;
        let project = projects::table
            .filter(projects::id.eq(id))
            .filter(projects::company_id.eq(tenant_id))
            .first::<DbProject>(&mut conn)
            .await
            .optional()?;
        Ok(project.map(Project::from))
    }
}

#[async_trait]
impl InventoryLookup for PgStore {
    async fn inventory_item_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<InventoryItem>> {
        let mut conn = self.conn().await?;
        let item = inventory::table
            .filter(inventory::id.eq(id))
            .filter(inventory::company_id.eq(tenant_id))
            .first::<DbInventoryItem>(&mut conn)
            .await
            .optional()?;
        Ok(item.map(InventoryItem::from))
    }
}

#[async_trait]
impl CompanyLookup for PgStore {
    async fn company_for_user(&self, user_id: Uuid) -> StoreResult<Option<Company>> {
        let mut conn = self.conn().await?;
        let company = companies::table
            .filter(companies::user_id.eq(user_id))
            .first::<DbCompany>(&mut conn)
            .await
            .optional()?;
        Ok(company.map(Company::from))
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn reservations_in_window(
        &self,
        tenant_id: Uuid,
        item_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Reservation>> {
        let mut conn = self.conn().await?;
        let rows = project_equipment::table
            .filter(project_equipment::company_id.eq(tenant_id))
            .filter(project_equipment::item_id.eq(item_id))
            .filter(project_equipment::check_in.le(to))
            .filter(project_equipment::check_out.ge(from))
            .order(project_equipment::check_in.asc())
            .load::<DbReservation>(&mut conn)
            .await?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation> {
        let mut conn = self.conn().await?;
        let row = diesel::insert_into(project_equipment::table)
            .values(&NewDbReservation::from(&reservation))
            .get_result::<DbReservation>(&mut conn)
            .await?;
        Ok(row.into())
    }

    async fn insert_reservations(&self, reservations: Vec<Reservation>) -> StoreResult<usize> {
        if reservations.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewDbReservation> = reservations.iter().map(NewDbReservation::from).collect();
        let mut conn = self.conn().await?;
        // a single multi-row INSERT, so either every row lands or none does
        let count = diesel::insert_into(project_equipment::table)
            .values(&rows)
            .execute(&mut conn)
            .await?;
        Ok(count)
    }

    async fn reservation_by_id(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Reservation>> {
        let mut conn = self.conn().await?;
        let row = project_equipment::table
            .filter(project_equipment::id.eq(id))
            .filter(project_equipment::company_id.eq(tenant_id))
            .first::<DbReservation>(&mut conn)
            .await
            .optional()?;
        Ok(row.map(Reservation::from))
    }

    async fn reservations_for_tenant(&self, tenant_id: Uuid, sort: ReservationSort) -> StoreResult<Vec<Reservation>> {
        let mut conn = self.conn().await?;
        let query = project_equipment::table
            .filter(project_equipment::company_id.eq(tenant_id))
            .into_boxed();
        let query = match sort {
            ReservationSort::CheckIn => query.order(project_equipment::check_in.asc()),
            ReservationSort::CheckOut => query.order(project_equipment::check_out.asc()),
            ReservationSort::ProjectId => query.order(project_equipment::project_id.asc()),
            ReservationSort::ItemId => query.order(project_equipment::item_id.asc()),
        };
        let rows = query
            .then_order_by(project_equipment::id.asc())
            .load::<DbReservation>(&mut conn)
            .await?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn reservations_by_project(&self, tenant_id: Uuid, project_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let mut conn = self.conn().await?;
        let rows = project_equipment::table
            .filter(project_equipment::company_id.eq(tenant_id))
            .filter(project_equipment::project_id.eq(project_id))
            .order(project_equipment::check_in.asc())
            .load::<DbReservation>(&mut conn)
            .await?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn update_reservation(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: ReservationUpdate,
    ) -> StoreResult<Option<Reservation>> {
        let mut conn = self.conn().await?;
        let row = diesel::update(
            project_equipment::table
                .filter(project_equipment::id.eq(id))
                .filter(project_equipment::company_id.eq(tenant_id)),
        )
        .set(&DbReservationChangeset::from(update))
        .get_result::<DbReservation>(&mut conn)
        .await
        .optional()?;
        Ok(row.map(Reservation::from))
    }

    async fn update_reservations(
        &self,
        tenant_id: Uuid,
        entries: Vec<ReservationUpdateEntry>,
    ) -> StoreResult<BulkUpdate> {
        if entries.is_empty() {
            return Ok(BulkUpdate::Updated(0));
        }
        let mut conn = self.conn().await?;
        let result = conn
            .transaction::<_, BulkAbort, _>(|conn| {
                Box::pin(async move {
                    let mut count = 0;
                    for entry in entries {
                        let updated = diesel::update(
                            project_equipment::table
                                .filter(project_equipment::id.eq(entry.id))
                                .filter(project_equipment::company_id.eq(tenant_id)),
                        )
                        .set(&DbReservationChangeset::from(entry.update))
                        .execute(conn)
                        .await?;
                        if updated == 0 {
                            return Err(BulkAbort::Missing(entry.id));
                        }
                        count += updated;
                    }
                    Ok(count)
                })
            })
            .await;

        match result {
            Ok(count) => Ok(BulkUpdate::Updated(count)),
            Err(BulkAbort::Missing(id)) => Ok(BulkUpdate::Missing(id)),
            Err(BulkAbort::Store(e)) => Err(e),
        }
    }

    async fn delete_reservation(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Reservation>> {
        let mut conn = self.conn().await?;
        let row = diesel::delete(
            project_equipment::table
                .filter(project_equipment::id.eq(id))
                .filter(project_equipment::company_id.eq(tenant_id)),
        )
        .get_result::<DbReservation>(&mut conn)
        .await
        .optional()?;
        Ok(row.map(Reservation::from))
    }

    async fn delete_reservations_for_tenant(&self, tenant_id: Uuid) -> StoreResult<usize> {
        let mut conn = self.conn().await?;
        let count = diesel::delete(project_equipment::table.filter(project_equipment::company_id.eq(tenant_id)))
            .execute(&mut conn)
            .await?;
        Ok(count)
    }
}
