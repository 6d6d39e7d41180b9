use chrono::NaiveDate;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Project,
    Reservation,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Project => write!(f, "project"),
            Entity::Reservation => write!(f, "reservation"),
        }
    }
}

/// Persistence failures, independent of the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("provided record already exists in the database")]
    UniqueViolation,
    #[error("referenced record does not exist: {0}")]
    ForeignKeyViolation(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
}

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => StoreError::UniqueViolation,
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::ForeignKeyViolation(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                StoreError::Connection(info.message().to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// The booking window is malformed or does not contain the project date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("check-in {check_in} is after check-out {check_out}")]
    Reversed { check_in: NaiveDate, check_out: NaiveDate },
    #[error("booking window {check_in}..={check_out} does not contain project date {project_date}")]
    ExcludesProjectDate {
        check_in: NaiveDate,
        check_out: NaiveDate,
        project_date: NaiveDate,
    },
}

/// Every unit of the item is already reserved on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("item {item_id} is fully booked on {date}: {reserved} of {stock} units reserved")]
pub struct OverbookingError {
    pub item_id: Uuid,
    pub date: NaiveDate,
    pub reserved: usize,
    pub stock: u32,
}

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: Uuid },
    #[error(transparent)]
    DateRange(#[from] DateRangeError),
    #[error(transparent)]
    Overbooking(#[from] OverbookingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReservationError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        ReservationError::NotFound { entity, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_becomes_query_error() {
        let err = StoreError::from(DieselError::NotFound);
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn error_kinds_survive_conversion() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let err: ReservationError = OverbookingError {
            item_id: Uuid::nil(),
            date: day,
            reserved: 1,
            stock: 1,
        }
        .into();
        assert!(matches!(err, ReservationError::Overbooking(_)));

        let err: ReservationError = DateRangeError::Reversed {
            check_in: day.succ_opt().unwrap(),
            check_out: day,
        }
        .into();
        assert!(matches!(err, ReservationError::DateRange(_)));
        assert_eq!(err.to_string(), "check-in 2024-01-06 is after check-out 2024-01-05");
    }
}
