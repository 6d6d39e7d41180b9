use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use shared::*;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::companies)]
pub struct DbCompany {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::inventory)]
pub struct DbInventoryItem {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub stock: i32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::projects)]
pub struct DbProject {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::project_equipment)]
pub struct DbReservation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub item_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::project_equipment)]
pub struct NewDbReservation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub item_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::project_equipment)]
pub struct DbReservationChangeset {
    pub project_id: Uuid,
    pub item_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<DbCompany> for Company {
    fn from(row: DbCompany) -> Self {
        Self {
            id: row.id,
            name: row.name,
            user_id: row.user_id,
        }
    }
}

impl From<DbInventoryItem> for InventoryItem {
    fn from(row: DbInventoryItem) -> Self {
        Self {
            id: row.id,
            tenant_id: row.company_id,
            name: row.name,
            // the column carries a CHECK (stock >= 0)
            stock: u32::try_from(row.stock).unwrap_or(0),
        }
    }
}

impl From<DbProject> for Project {
    fn from(row: DbProject) -> Self {
        Self {
            id: row.id,
            tenant_id: row.company_id,
            name: row.name,
            date: row.date,
        }
    }
}

impl From<DbReservation> for Reservation {
    fn from(row: DbReservation) -> Self {
        Self {
            id: row.id,
            tenant_id: row.company_id,
            project_id: row.project_id,
            item_id: row.item_id,
            check_in: row.check_in,
            check_out: row.check_out,
        }
    }
}

impl From<&Reservation> for NewDbReservation {
    fn from(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id,
            company_id: reservation.tenant_id,
            project_id: reservation.project_id,
            item_id: reservation.item_id,
            check_in: reservation.check_in,
            check_out: reservation.check_out,
        }
    }
}

impl From<ReservationUpdate> for DbReservationChangeset {
    fn from(update: ReservationUpdate) -> Self {
        Self {
            project_id: update.project_id,
            item_id: update.item_id,
            check_in: update.check_in,
            check_out: update.check_out,
            updated_at: Some(Utc::now()),
        }
    }
}
