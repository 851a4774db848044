//! Static timeline of the April 2026 trip.

use chrono::NaiveDate;
use serde::Serialize;

/// What happens at a point on the timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Flight {
        flight_number: &'static str,
        /// Local departure - arrival, "+1" marks next-day arrival.
        time: &'static str,
        duration: &'static str,
    },
    Arrival,
    Stay {
        nights: u32,
    },
    Layover {
        duration: &'static str,
    },
}

/// A single timeline entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItineraryEvent {
    /// Day the event starts (check-in day for stays).
    pub date: NaiveDate,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ItineraryEvent {
    /// Short date label, e.g. "07 Apr"; stays render as "07-14 Apr".
    pub fn date_label(&self) -> String {
        match self.kind {
            EventKind::Stay { nights } => {
                let end = self.date + chrono::Days::new(u64::from(nights));
                format!("{}-{}", self.date.format("%d"), end.format("%d %b"))
            }
            _ => self.date.format("%d %b").to_string(),
        }
    }
}

fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, d).unwrap_or_default()
}

fn flight(
    date: NaiveDate,
    label: &'static str,
    flight_number: &'static str,
    time: &'static str,
    duration: &'static str,
) -> ItineraryEvent {
    ItineraryEvent {
        date,
        label,
        kind: EventKind::Flight {
            flight_number,
            time,
            duration,
        },
    }
}

fn arrival(date: NaiveDate, label: &'static str) -> ItineraryEvent {
    ItineraryEvent {
        date,
        label,
        kind: EventKind::Arrival,
    }
}

fn stay(date: NaiveDate, label: &'static str, nights: u32) -> ItineraryEvent {
    ItineraryEvent {
        date,
        label,
        kind: EventKind::Stay { nights },
    }
}

/// The trip in chronological order.
pub fn timeline() -> Vec<ItineraryEvent> {
    vec![
        flight(day(3, 31), "LHR → SIN", "BA11", "19:35 - 16:05+1", "13h 30m"),
        arrival(day(4, 1), "Arrive Singapore"),
        stay(day(4, 1), "Singapore", 3),
        flight(day(4, 4), "SIN → KUL", "MH608", "18:15 - 19:25", "1h 10m"),
        arrival(day(4, 4), "Arrive Malaysia"),
        stay(day(4, 4), "Kuala Lumpur", 3),
        flight(day(4, 7), "KUL → DPS", "QZ551", "10:35 - 13:40", "3h 5m"),
        arrival(day(4, 7), "Arrive Indonesia"),
        stay(day(4, 7), "Bali", 7),
        flight(day(4, 14), "DPS → SIN", "JQ88", "15:05 - 18:00", "2h 55m"),
        arrival(day(4, 14), "Arrive Singapore"),
        stay(day(4, 14), "Singapore", 1),
        flight(day(4, 15), "SIN → DOH", "QR947", "19:40 - 22:40", "8h 0m"),
        arrival(day(4, 15), "Arrive Qatar"),
        ItineraryEvent {
            date: day(4, 15),
            label: "Doha Layover",
            kind: EventKind::Layover { duration: "2h 25m" },
        },
        flight(day(4, 16), "DOH → LGW", "QR009", "01:30 - 06:40", "7h 10m"),
        arrival(day(4, 16), "Arrive United Kingdom"),
    ]
}

/// Nights spent in booked accommodation across the timeline.
pub fn total_nights(events: &[ItineraryEvent]) -> u32 {
    events
        .iter()
        .map(|e| match e.kind {
            EventKind::Stay { nights } => nights,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_is_chronological() {
        let events = timeline();
        assert!(events.windows(2).all(|w| w[0].date <= w[1].date));
        assert_eq!(events.first().map(|e| e.date), Some(day(3, 31)));
        assert_eq!(events.last().map(|e| e.label), Some("Arrive United Kingdom"));
    }

    #[test]
    fn stays_add_up_to_fourteen_nights() {
        assert_eq!(total_nights(&timeline()), 14);
    }

    #[test]
    fn date_labels() {
        let events = timeline();
        assert_eq!(events[0].date_label(), "31 Mar");
        let bali = events.iter().find(|e| e.label == "Bali").unwrap();
        assert_eq!(bali.date_label(), "07-14 Apr");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let v = serde_json::to_value(&timeline()[0]).unwrap();
        assert_eq!(v["type"], "flight");
        assert_eq!(v["flight_number"], "BA11");
        assert_eq!(v["date"], "2026-03-31");
    }
}
