use chrono::NaiveDate;
use shared::*;

/// Which existing reservations count against a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConflictPolicy {
    /// Only reservations covering the candidate's check-in date.
    CheckIn,
    /// Every date of the candidate's window must have a free unit.
    #[default]
    FullRange,
}

impl ConflictPolicy {
    /// Date window whose overlapping reservations must be loaded.
    pub fn window(self, candidate: &NewReservation) -> (NaiveDate, NaiveDate) {
        match self {
            ConflictPolicy::CheckIn => (candidate.check_in, candidate.check_in),
            ConflictPolicy::FullRange => (candidate.check_in, candidate.check_out),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    DateRange(DateRangeError),
    Overbooking(OverbookingError),
}

impl From<Rejection> for ReservationError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::DateRange(e) => ReservationError::DateRange(e),
            Rejection::Overbooking(e) => ReservationError::Overbooking(e),
        }
    }
}

impl From<DateRangeError> for Rejection {
    fn from(e: DateRangeError) -> Self {
        Rejection::DateRange(e)
    }
}

pub fn validate_window(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), DateRangeError> {
    if check_in > check_out {
        return Err(DateRangeError::Reversed { check_in, check_out });
    }
    Ok(())
}

/// Decides whether `candidate` may be admitted.
///
/// A reversed window or one that excludes `project_date` is rejected before
/// capacity is looked at. Capacity is strict: the candidate needs
/// `reserved < stock` on the date(s) selected by `policy`, so `stock == 0`
/// never admits anything.
pub fn check_availability(
    candidate: &NewReservation,
    project_date: NaiveDate,
    conflicting: &[Reservation],
    stock: u32,
    policy: ConflictPolicy,
) -> Result<(), Rejection> {
    validate_window(candidate.check_in, candidate.check_out)?;

    if !candidate.contains(project_date) {
        return Err(Rejection::DateRange(DateRangeError::ExcludesProjectDate {
            check_in: candidate.check_in,
            check_out: candidate.check_out,
            project_date,
        }));
    }

    let (date, reserved) = match policy {
        ConflictPolicy::CheckIn => {
            let reserved = conflicting.iter().filter(|r| r.covers(candidate.check_in)).count();
            (candidate.check_in, reserved)
        }
        ConflictPolicy::FullRange => peak_usage(conflicting, candidate.check_in, candidate.check_out),
    };

    if reserved < stock as usize {
        Ok(())
    } else {
        Err(Rejection::Overbooking(OverbookingError {
            item_id: candidate.item_id,
            date,
            reserved,
            stock,
        }))
    }
}

pub fn is_available(
    candidate: &NewReservation,
    project_date: NaiveDate,
    conflicting: &[Reservation],
    stock: u32,
    policy: ConflictPolicy,
) -> bool {
    check_availability(candidate, project_date, conflicting, stock, policy).is_ok()
}

/// Highest number of reservations covering a single day of `[from, to]`,
/// with the first day that reaches it.
fn peak_usage(reservations: &[Reservation], from: NaiveDate, to: NaiveDate) -> (NaiveDate, usize) {
    let mut events: Vec<(NaiveDate, i64)> = Vec::with_capacity(reservations.len() * 2);
    for r in reservations {
        let start = r.check_in.max(from);
        let end = r.check_out.min(to);
        if start > end {
            continue;
        }
        events.push((start, 1));
        if let Some(after) = end.succ_opt() {
            events.push((after, -1));
        }
    }
    // releases sort before acquisitions on the same day
    events.sort_unstable();

    let mut current: i64 = 0;
    let mut peak = (from, 0usize);
    for (date, delta) in events {
        current += delta;
        if current > 0 && current as usize > peak.1 {
            peak = (date, current as usize);
        }
    }
    peak
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn candidate(item_id: Uuid, check_in: &str, check_out: &str) -> NewReservation {
        NewReservation {
            project_id: Uuid::new_v4(),
            item_id,
            check_in: date(check_in),
            check_out: date(check_out),
        }
    }

    fn existing(item_id: Uuid, check_in: &str, check_out: &str) -> Reservation {
        Reservation::new(Uuid::new_v4(), candidate(item_id, check_in, check_out))
    }

    #[test]
    fn empty_item_with_stock_admits() {
        let item = Uuid::new_v4();
        let c = candidate(item, "2024-01-01", "2024-01-10");
        for policy in [ConflictPolicy::CheckIn, ConflictPolicy::FullRange] {
            assert_eq!(check_availability(&c, date("2024-01-05"), &[], 1, policy), Ok(()));
        }
    }

    #[test]
    fn last_unit_taken_is_overbooking() {
        let item = Uuid::new_v4();
        let c = candidate(item, "2024-01-01", "2024-01-10");
        let taken = vec![existing(item, "2024-01-01", "2024-01-10")];

        let err = check_availability(&c, date("2024-01-05"), &taken, 1, ConflictPolicy::FullRange).unwrap_err();
        assert_eq!(
            err,
            Rejection::Overbooking(OverbookingError {
                item_id: item,
                date: date("2024-01-01"),
                reserved: 1,
                stock: 1,
            })
        );
        assert!(!is_available(&c, date("2024-01-05"), &taken, 1, ConflictPolicy::CheckIn));
    }

    #[test]
    fn window_excluding_project_date_fails_regardless_of_stock() {
        let c = candidate(Uuid::new_v4(), "2024-01-01", "2024-01-10");
        let err = check_availability(&c, date("2024-02-01"), &[], 100, ConflictPolicy::FullRange).unwrap_err();
        assert!(matches!(err, Rejection::DateRange(DateRangeError::ExcludesProjectDate { .. })));
    }

    #[test]
    fn reversed_window_fails_before_capacity() {
        let item = Uuid::new_v4();
        let c = candidate(item, "2024-01-10", "2024-01-01");
        // zero stock would be an overbooking if capacity were looked at first
        let err = check_availability(&c, date("2024-01-05"), &[], 0, ConflictPolicy::FullRange).unwrap_err();
        assert!(matches!(err, Rejection::DateRange(DateRangeError::Reversed { .. })));
    }

    #[test]
    fn zero_stock_never_admits() {
        let c = candidate(Uuid::new_v4(), "2024-01-05", "2024-01-05");
        assert!(!is_available(&c, date("2024-01-05"), &[], 0, ConflictPolicy::CheckIn));
        assert!(!is_available(&c, date("2024-01-05"), &[], 0, ConflictPolicy::FullRange));
    }

    #[test]
    fn single_day_window_on_project_date_is_valid() {
        let c = candidate(Uuid::new_v4(), "2024-01-05", "2024-01-05");
        assert!(is_available(&c, date("2024-01-05"), &[], 1, ConflictPolicy::FullRange));
    }

    #[test]
    fn capacity_exactly_full_blocks() {
        let item = Uuid::new_v4();
        let c = candidate(item, "2024-01-03", "2024-01-06");
        let taken = vec![
            existing(item, "2024-01-01", "2024-01-04"),
            existing(item, "2024-01-03", "2024-01-03"),
        ];
        assert!(!is_available(&c, date("2024-01-04"), &taken, 2, ConflictPolicy::FullRange));
        assert!(is_available(&c, date("2024-01-04"), &taken, 3, ConflictPolicy::FullRange));
    }

    #[test]
    fn check_in_policy_ignores_later_overlap() {
        let item = Uuid::new_v4();
        let c = candidate(item, "2024-01-01", "2024-01-10");
        let taken = vec![existing(item, "2024-01-05", "2024-01-06")];

        assert!(is_available(&c, date("2024-01-05"), &taken, 1, ConflictPolicy::CheckIn));
        let err = check_availability(&c, date("2024-01-05"), &taken, 1, ConflictPolicy::FullRange).unwrap_err();
        match err {
            Rejection::Overbooking(e) => assert_eq!(e.date, date("2024-01-05")),
            other => panic!("unexpected rejection: {other:?}"),
        }
    }

    #[test]
    fn back_to_back_reservations_do_not_stack() {
        let item = Uuid::new_v4();
        let c = candidate(item, "2024-01-01", "2024-01-10");
        let taken = vec![
            existing(item, "2024-01-01", "2024-01-03"),
            existing(item, "2024-01-04", "2024-01-06"),
            existing(item, "2024-01-07", "2024-01-10"),
        ];
        assert_eq!(peak_usage(&taken, date("2024-01-01"), date("2024-01-10")).1, 1);
        assert!(is_available(&c, date("2024-01-05"), &taken, 2, ConflictPolicy::FullRange));
    }

    #[test]
    fn peak_counts_only_days_inside_window() {
        let item = Uuid::new_v4();
        let taken = vec![
            existing(item, "2023-12-20", "2024-01-02"),
            existing(item, "2023-12-25", "2023-12-31"),
            existing(item, "2024-01-02", "2024-01-08"),
        ];
        assert_eq!(
            peak_usage(&taken, date("2024-01-01"), date("2024-01-10")),
            (date("2024-01-02"), 2)
        );
    }

    #[test]
    fn decision_is_pure() {
        let item = Uuid::new_v4();
        let c = candidate(item, "2024-01-01", "2024-01-10");
        let taken = vec![existing(item, "2024-01-02", "2024-01-03")];
        let (c_before, taken_before) = (c.clone(), taken.clone());

        let first = check_availability(&c, date("2024-01-05"), &taken, 1, ConflictPolicy::FullRange);
        let second = check_availability(&c, date("2024-01-05"), &taken, 1, ConflictPolicy::FullRange);
        assert_eq!(first, second);
        assert_eq!(c, c_before);
        assert_eq!(taken, taken_before);
    }
}
