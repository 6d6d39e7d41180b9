mod error;

pub use error::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An equipment booking: one unit of an inventory item held for a project
/// over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub project_id: Uuid,
    pub item_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// A reservation request as submitted by a caller. The tenant is never taken
/// from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub project_id: Uuid,
    pub item_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Full-record replacement for an existing reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub project_id: Uuid,
    pub item_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// One entry of a bulk update: the target id plus its replacement record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationUpdateEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub update: ReservationUpdate,
}

/// Ordering for tenant-wide listings. Ties are broken by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationSort {
    #[default]
    CheckIn,
    CheckOut,
    ProjectId,
    ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
}

/// Result of a bulk write or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPayload {
    pub count: usize,
}

/// JSON envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reservation {
    pub fn new(tenant_id: Uuid, data: NewReservation) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            project_id: data.project_id,
            item_id: data.item_id,
            check_in: data.check_in,
            check_out: data.check_out,
        }
    }

    /// Whether `date` falls inside the inclusive booking window.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date <= self.check_out
    }

    /// Whether the booking window shares at least one day with `[from, to]`.
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.check_in <= to && from <= self.check_out
    }

    pub fn apply(&mut self, update: ReservationUpdate) {
        self.project_id = update.project_id;
        self.item_id = update.item_id;
        self.check_in = update.check_in;
        self.check_out = update.check_out;
    }
}

impl NewReservation {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date <= self.check_out
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Not found".to_string()),
            error: None,
        }
    }
}
