//! Reservation slot checks against a resource's occupied hours.

use chrono::NaiveTime;

use crate::domain::TimeSlot;

/// Parses `HH:MM`, ignoring anything after the first five characters
/// (the reservations service sends `HH:MM:SS`).
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let head = value.get(..5).unwrap_or(value);
    NaiveTime::parse_from_str(head, "%H:%M").ok()
}

/// Whether `[start, end)` overlaps none of the occupied slots.
///
/// Occupied slots that cannot be parsed are ignored.
pub fn is_slot_free(start: NaiveTime, end: NaiveTime, occupied: &[TimeSlot]) -> bool {
    occupied.iter().all(|slot| {
        match (parse_clock(&slot.inicio), parse_clock(&slot.fin)) {
            (Some(busy_start), Some(busy_end)) => end <= busy_start || start >= busy_end,
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(inicio: &str, fin: &str) -> TimeSlot {
        TimeSlot {
            inicio: inicio.to_string(),
            fin: fin.to_string(),
        }
    }

    fn t(value: &str) -> NaiveTime {
        parse_clock(value).unwrap()
    }

    #[test]
    fn parses_with_and_without_seconds() {
        assert_eq!(t("08:30"), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(t("08:30:59"), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert!(parse_clock("8h30").is_none());
        assert!(parse_clock("").is_none());
    }

    #[test]
    fn overlapping_slots_are_taken() {
        let busy = [slot("09:00:00", "11:00:00")];
        assert!(!is_slot_free(t("08:00"), t("10:00"), &busy));
        assert!(!is_slot_free(t("10:00"), t("12:00"), &busy));
        assert!(!is_slot_free(t("09:30"), t("10:30"), &busy));
        assert!(!is_slot_free(t("08:00"), t("12:00"), &busy));
    }

    #[test]
    fn touching_slots_are_free() {
        let busy = [slot("09:00", "11:00")];
        assert!(is_slot_free(t("08:00"), t("09:00"), &busy));
        assert!(is_slot_free(t("11:00"), t("13:00"), &busy));
    }

    #[test]
    fn no_occupied_slots_means_free() {
        assert!(is_slot_free(t("08:00"), t("10:00"), &[]));
    }
}
