#![deny(warnings)]

//! Core domain models and invariants for the trip planner.
//!
//! This crate defines the serializable records edited by the user (scenario
//! [`Assumptions`] and the planner [`TripBudget`]), validation helpers that
//! guard their invariants, and [`parse_amount`], the single place where raw
//! text from an edit becomes a monetary amount.

pub mod itinerary;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Largest amount accepted for any monetary field. Keeps every sum and
/// couple total the calculators derive inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Destinations with committed accommodation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    /// Singapore, first and last stop.
    Singapore,
    /// Kuala Lumpur, Malaysia.
    KualaLumpur,
    /// Bali, Indonesia; the last destination before the return.
    Bali,
}

impl Destination {
    /// All destinations in travel order.
    pub const ALL: [Destination; 3] = [
        Destination::Singapore,
        Destination::KualaLumpur,
        Destination::Bali,
    ];

    /// Field name used in persisted records, e.g. "kualaLumpur".
    pub fn key(self) -> &'static str {
        match self {
            Destination::Singapore => "singapore",
            Destination::KualaLumpur => "kualaLumpur",
            Destination::Bali => "bali",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Destination::Singapore => "Singapore",
            Destination::KualaLumpur => "Kuala Lumpur",
            Destination::Bali => "Bali",
        };
        f.write_str(name)
    }
}

/// Pre-booked flight legs priced in [`FlightFares`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Leg {
    /// London Heathrow to Singapore.
    LhrToSin,
    /// Singapore to London Heathrow (the cancellable return).
    SinToLhr,
    /// Singapore to Kuala Lumpur.
    SinToKul,
    /// Kuala Lumpur to Denpasar.
    KulToDps,
    /// Denpasar to Singapore (date can move, no refund).
    DpsToSin,
}

impl Leg {
    /// All legs in booking order.
    pub const ALL: [Leg; 5] = [
        Leg::LhrToSin,
        Leg::SinToLhr,
        Leg::SinToKul,
        Leg::KulToDps,
        Leg::DpsToSin,
    ];

    /// Field name used in persisted records and breakdowns.
    pub fn key(self) -> &'static str {
        match self {
            Leg::LhrToSin => "lhrToSin",
            Leg::SinToLhr => "sinToLhr",
            Leg::SinToKul => "sinToKul",
            Leg::KulToDps => "kulToDps",
            Leg::DpsToSin => "dpsToSin",
        }
    }
}

/// Per-person fares for the booked legs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightFares {
    pub lhr_to_sin: Decimal,
    pub sin_to_lhr: Decimal,
    pub sin_to_kul: Decimal,
    pub kul_to_dps: Decimal,
    pub dps_to_sin: Decimal,
}

impl FlightFares {
    /// Fare for a single leg.
    pub fn fare(&self, leg: Leg) -> Decimal {
        match leg {
            Leg::LhrToSin => self.lhr_to_sin,
            Leg::SinToLhr => self.sin_to_lhr,
            Leg::SinToKul => self.sin_to_kul,
            Leg::KulToDps => self.kul_to_dps,
            Leg::DpsToSin => self.dps_to_sin,
        }
    }

    fn fare_mut(&mut self, leg: Leg) -> &mut Decimal {
        match leg {
            Leg::LhrToSin => &mut self.lhr_to_sin,
            Leg::SinToLhr => &mut self.sin_to_lhr,
            Leg::SinToKul => &mut self.sin_to_kul,
            Leg::KulToDps => &mut self.kul_to_dps,
            Leg::DpsToSin => &mut self.dps_to_sin,
        }
    }
}

/// One value per destination, serialized with the destination keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerDestination<T> {
    pub singapore: T,
    pub kuala_lumpur: T,
    pub bali: T,
}

impl<T: Copy> PerDestination<T> {
    /// Value for a destination.
    pub fn get(&self, d: Destination) -> T {
        match d {
            Destination::Singapore => self.singapore,
            Destination::KualaLumpur => self.kuala_lumpur,
            Destination::Bali => self.bali,
        }
    }
}

impl<T> PerDestination<T> {
    fn get_mut(&mut self, d: Destination) -> &mut T {
        match d {
            Destination::Singapore => &mut self.singapore,
            Destination::KualaLumpur => &mut self.kuala_lumpur,
            Destination::Bali => &mut self.bali,
        }
    }
}

/// Inputs specific to the extend-stay scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendStayInputs {
    /// Per-person fare of the later replacement return flight.
    pub new_sin_to_lhr: Decimal,
}

/// Inputs specific to the layover-reroute scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoverInputs {
    /// Per-person bundle: SIN→DOH, two nights in Doha, DOH→LON.
    pub qatar_bundle: Decimal,
}

/// The sole mutable input to every scenario calculation.
///
/// Accommodation amounts are totals for two people; flight and scenario
/// fares are per person. `assumed_nights` only derives per-night rates and
/// is treated as a trusted constant: it is not reachable through
/// [`Assumptions::set_amount`] and must stay strictly positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumptions {
    pub flights: FlightFares,
    pub accommodation: PerDestination<Decimal>,
    pub assumed_nights: PerDestination<u32>,
    pub scenario2: ExtendStayInputs,
    pub scenario3: LayoverInputs,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            flights: FlightFares {
                lhr_to_sin: Decimal::new(312, 0),
                sin_to_lhr: Decimal::new(125, 0),
                sin_to_kul: Decimal::new(60, 0),
                kul_to_dps: Decimal::new(46, 0),
                dps_to_sin: Decimal::new(70, 0),
            },
            accommodation: PerDestination {
                singapore: Decimal::new(300, 0),
                kuala_lumpur: Decimal::new(200, 0),
                bali: Decimal::new(600, 0),
            },
            assumed_nights: PerDestination {
                singapore: 3,
                kuala_lumpur: 3,
                bali: 5,
            },
            scenario2: ExtendStayInputs {
                new_sin_to_lhr: Decimal::new(250, 0),
            },
            scenario3: LayoverInputs {
                qatar_bundle: Decimal::new(280, 0),
            },
        }
    }
}

impl Assumptions {
    /// Field paths a user may edit, in display order.
    pub const EDITABLE_FIELDS: [&'static str; 10] = [
        "flights.lhrToSin",
        "flights.sinToLhr",
        "flights.sinToKul",
        "flights.kulToDps",
        "flights.dpsToSin",
        "accommodation.singapore",
        "accommodation.kualaLumpur",
        "accommodation.bali",
        "scenario2.newSinToLhr",
        "scenario3.qatarBundle",
    ];

    /// Current value of an editable field.
    pub fn amount(&self, path: &str) -> Option<Decimal> {
        Some(match AssumptionField::resolve(path)? {
            AssumptionField::Fare(leg) => self.flights.fare(leg),
            AssumptionField::Lodging(d) => self.accommodation.get(d),
            AssumptionField::ReplacementReturn => self.scenario2.new_sin_to_lhr,
            AssumptionField::Bundle => self.scenario3.qatar_bundle,
        })
    }

    /// Replace one editable field. The amount must already be coerced by
    /// [`parse_amount`]; negative values and values above [`MAX_AMOUNT`]
    /// are rejected.
    pub fn set_amount(&mut self, path: &str, amount: Decimal) -> Result<(), ValidationError> {
        check_amount(path, amount)?;
        let field = AssumptionField::resolve(path)
            .ok_or_else(|| ValidationError::UnknownField(path.to_string()))?;
        let slot = match field {
            AssumptionField::Fare(leg) => self.flights.fare_mut(leg),
            AssumptionField::Lodging(d) => self.accommodation.get_mut(d),
            AssumptionField::ReplacementReturn => &mut self.scenario2.new_sin_to_lhr,
            AssumptionField::Bundle => &mut self.scenario3.qatar_bundle,
        };
        debug!(path, %amount, "assumption edited");
        *slot = amount;
        Ok(())
    }
}

/// An editable [`Assumptions`] field, resolved from its persisted path.
#[derive(Clone, Copy)]
enum AssumptionField {
    Fare(Leg),
    Lodging(Destination),
    ReplacementReturn,
    Bundle,
}

impl AssumptionField {
    fn resolve(path: &str) -> Option<Self> {
        let (section, field) = path.split_once('.')?;
        match (section, field) {
            ("flights", _) => Leg::ALL
                .into_iter()
                .find(|l| l.key() == field)
                .map(AssumptionField::Fare),
            ("accommodation", _) => Destination::ALL
                .into_iter()
                .find(|d| d.key() == field)
                .map(AssumptionField::Lodging),
            ("scenario2", "newSinToLhr") => Some(AssumptionField::ReplacementReturn),
            ("scenario3", "qatarBundle") => Some(AssumptionField::Bundle),
            _ => None,
        }
    }
}

/// Per-person flight fares on the planner page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerFlights {
    pub lhr_to_sin: Decimal,
    pub sin_to_kul: Decimal,
    pub kul_to_dps: Decimal,
    pub dps_to_sin: Decimal,
    pub sin_to_doh: Decimal,
    pub doh_to_lgw: Decimal,
}

/// Lodging totals for two people on the planner page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerAccommodation {
    pub singapore: Decimal,
    pub kuala_lumpur: Decimal,
    pub bali: Decimal,
    pub singapore_extra: Decimal,
}

/// Per-person, per-day spending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyExpenses {
    pub food: Decimal,
    pub activities: Decimal,
}

/// The committed trip as edited on the planner page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripBudget {
    pub flights: PlannerFlights,
    pub accommodation: PlannerAccommodation,
    pub daily_expenses: DailyExpenses,
    pub total_days: u32,
}

impl Default for TripBudget {
    fn default() -> Self {
        Self {
            flights: PlannerFlights {
                lhr_to_sin: Decimal::new(312, 0),
                sin_to_kul: Decimal::new(60, 0),
                kul_to_dps: Decimal::new(46, 0),
                dps_to_sin: Decimal::new(70, 0),
                sin_to_doh: Decimal::new(125, 0),
                doh_to_lgw: Decimal::new(125, 0),
            },
            accommodation: PlannerAccommodation {
                singapore: Decimal::new(300, 0),
                kuala_lumpur: Decimal::new(200, 0),
                bali: Decimal::new(840, 0),
                singapore_extra: Decimal::new(100, 0),
            },
            daily_expenses: DailyExpenses {
                food: Decimal::new(50, 0),
                activities: Decimal::new(30, 0),
            },
            total_days: 15,
        }
    }
}

impl TripBudget {
    /// Field paths a user may edit, in display order.
    pub const EDITABLE_FIELDS: [&'static str; 13] = [
        "flights.lhrToSin",
        "flights.sinToKul",
        "flights.kulToDps",
        "flights.dpsToSin",
        "flights.sinToDoh",
        "flights.dohToLgw",
        "accommodation.singapore",
        "accommodation.kualaLumpur",
        "accommodation.bali",
        "accommodation.singaporeExtra",
        "dailyExpenses.food",
        "dailyExpenses.activities",
        "totalDays",
    ];

    fn amount_mut(&mut self, path: &str) -> Option<&mut Decimal> {
        let f = &mut self.flights;
        let a = &mut self.accommodation;
        let e = &mut self.daily_expenses;
        match path {
            "flights.lhrToSin" => Some(&mut f.lhr_to_sin),
            "flights.sinToKul" => Some(&mut f.sin_to_kul),
            "flights.kulToDps" => Some(&mut f.kul_to_dps),
            "flights.dpsToSin" => Some(&mut f.dps_to_sin),
            "flights.sinToDoh" => Some(&mut f.sin_to_doh),
            "flights.dohToLgw" => Some(&mut f.doh_to_lgw),
            "accommodation.singapore" => Some(&mut a.singapore),
            "accommodation.kualaLumpur" => Some(&mut a.kuala_lumpur),
            "accommodation.bali" => Some(&mut a.bali),
            "accommodation.singaporeExtra" => Some(&mut a.singapore_extra),
            "dailyExpenses.food" => Some(&mut e.food),
            "dailyExpenses.activities" => Some(&mut e.activities),
            _ => None,
        }
    }

    /// Current value of an editable field. `totalDays` is reported as a
    /// whole number.
    pub fn amount(&self, path: &str) -> Option<Decimal> {
        let f = &self.flights;
        let a = &self.accommodation;
        let e = &self.daily_expenses;
        match path {
            "flights.lhrToSin" => Some(f.lhr_to_sin),
            "flights.sinToKul" => Some(f.sin_to_kul),
            "flights.kulToDps" => Some(f.kul_to_dps),
            "flights.dpsToSin" => Some(f.dps_to_sin),
            "flights.sinToDoh" => Some(f.sin_to_doh),
            "flights.dohToLgw" => Some(f.doh_to_lgw),
            "accommodation.singapore" => Some(a.singapore),
            "accommodation.kualaLumpur" => Some(a.kuala_lumpur),
            "accommodation.bali" => Some(a.bali),
            "accommodation.singaporeExtra" => Some(a.singapore_extra),
            "dailyExpenses.food" => Some(e.food),
            "dailyExpenses.activities" => Some(e.activities),
            "totalDays" => Some(Decimal::from(self.total_days)),
            _ => None,
        }
    }

    /// Replace one editable field; `totalDays` keeps the whole part only.
    pub fn set_amount(&mut self, path: &str, amount: Decimal) -> Result<(), ValidationError> {
        check_amount(path, amount)?;
        if path == "totalDays" {
            self.total_days = whole_units(amount);
            return Ok(());
        }
        let slot = self
            .amount_mut(path)
            .ok_or_else(|| ValidationError::UnknownField(path.to_string()))?;
        debug!(path, %amount, "planner budget edited");
        *slot = amount;
        Ok(())
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Monetary field below zero.
    #[error("negative monetary value for {0}")]
    NegativeMoney(String),
    /// Monetary field above [`MAX_AMOUNT`].
    #[error("amount for {0} exceeds the maximum of 1000000000")]
    AmountTooLarge(String),
    /// Assumed nights must be > 0; they divide accommodation totals.
    #[error("assumed nights for {0} must be greater than zero")]
    ZeroNights(Destination),
    /// Field path not known or not editable.
    #[error("unknown or read-only field: {0}")]
    UnknownField(String),
    /// The layover scenario only has dates for 0, 1 or 2 extra nights.
    #[error("layover scenario supports 0, 1 or 2 extra nights, got {0}")]
    LayoverNightsOutOfRange(u32),
}

fn check_amount(path: &str, amount: Decimal) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney(path.to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge(path.to_string()));
    }
    Ok(())
}

/// Validate scenario assumptions: every amount within `0..=MAX_AMOUNT`,
/// every assumed night count strictly positive.
pub fn validate_assumptions(a: &Assumptions) -> Result<(), ValidationError> {
    for path in Assumptions::EDITABLE_FIELDS {
        if let Some(v) = a.amount(path) {
            check_amount(path, v)?;
        }
    }
    for d in Destination::ALL {
        if a.assumed_nights.get(d) == 0 {
            return Err(ValidationError::ZeroNights(d));
        }
    }
    Ok(())
}

/// Validate the planner record: every amount within `0..=MAX_AMOUNT`.
pub fn validate_trip_budget(b: &TripBudget) -> Result<(), ValidationError> {
    for path in TripBudget::EDITABLE_FIELDS {
        if let Some(v) = b.amount(path) {
            check_amount(path, v)?;
        }
    }
    Ok(())
}

/// Only 0, 1 and 2 extra Bali nights have a rebooked DPS→SIN date in the
/// layover scenario.
pub fn validate_layover_extra_nights(nights: u32) -> Result<(), ValidationError> {
    if nights > 2 {
        return Err(ValidationError::LayoverNightsOutOfRange(nights));
    }
    Ok(())
}

/// Coerce raw edit text to a monetary amount.
///
/// Leading whitespace and a `£` sign are ignored and the longest numeric
/// prefix is parsed, so "12.50 pp" reads as 12.50 and "1e3" as 1000. Empty,
/// non-numeric, negative or unrepresentable input yields zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let s = raw.trim();
    let s = s.strip_prefix('£').unwrap_or(s).trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in digits.char_indices() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if negative || !seen_digit {
        return Decimal::ZERO;
    }
    let number = digits[..end].trim_end_matches('.');
    let number = if number.starts_with('.') {
        format!("0{number}")
    } else {
        number.to_string()
    };
    let Ok(mantissa) = Decimal::from_str(&number) else {
        return Decimal::ZERO;
    };
    match exponent(&digits[end..]) {
        Some(exp) => scale_by_ten(mantissa, exp).unwrap_or(Decimal::ZERO),
        None => mantissa,
    }
}

/// Exponent suffix such as "e3" or "E-2". A bare "e" is not an exponent.
fn exponent(rest: &str) -> Option<i32> {
    let rest = rest.strip_prefix(|c: char| c == 'e' || c == 'E')?;
    let (sign, rest) = match rest.as_bytes().first() {
        Some(b'-') => (-1, &rest[1..]),
        Some(b'+') => (1, &rest[1..]),
        _ => (1, rest),
    };
    let len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    // Anything past 64 either overflows or rounds to zero.
    let magnitude = rest[..len].parse::<i32>().unwrap_or(i32::MAX).min(64);
    Some(sign * magnitude)
}

fn scale_by_ten(mut value: Decimal, exp: i32) -> Option<Decimal> {
    for _ in 0..exp.unsigned_abs() {
        value = if exp > 0 {
            value.checked_mul(Decimal::TEN)?
        } else {
            value.checked_div(Decimal::TEN)?
        };
    }
    Some(value)
}

/// Whole, non-negative units of an amount (fraction dropped, saturating).
pub fn whole_units(amount: Decimal) -> u32 {
    use rust_decimal::prelude::ToPrimitive;
    if amount <= Decimal::ZERO {
        return 0;
    }
    amount.trunc().to_u32().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn serde_roundtrip_assumptions_uses_persisted_names() {
        let a = Assumptions::default();
        let s = serde_json::to_string(&a).unwrap();
        assert!(s.contains("\"lhrToSin\""));
        assert!(s.contains("\"kualaLumpur\""));
        assert!(s.contains("\"assumedNights\""));
        assert!(s.contains("\"newSinToLhr\""));
        assert!(s.contains("\"qatarBundle\""));
        let back: Assumptions = serde_json::from_str(&s).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn amounts_are_plain_json_numbers() {
        let v = serde_json::to_value(Assumptions::default()).unwrap();
        assert_eq!(v["flights"]["lhrToSin"].as_f64(), Some(312.0));
        assert_eq!(v["assumedNights"]["bali"].as_u64(), Some(5));
    }

    #[test]
    fn reads_integer_json_written_by_hand() {
        let raw = r#"{
            "flights": {"lhrToSin": 300, "sinToLhr": 100, "sinToKul": 50, "kulToDps": 40, "dpsToSin": 65.5},
            "accommodation": {"singapore": 310, "kualaLumpur": 210, "bali": 610},
            "assumedNights": {"singapore": 3, "kualaLumpur": 3, "bali": 5},
            "scenario2": {"newSinToLhr": 240},
            "scenario3": {"qatarBundle": 270}
        }"#;
        let a: Assumptions = serde_json::from_str(raw).unwrap();
        assert_eq!(a.flights.dps_to_sin, Decimal::new(655, 1));
        assert_eq!(a.accommodation.get(Destination::KualaLumpur), Decimal::new(210, 0));
        validate_assumptions(&a).unwrap();
    }

    #[test]
    fn default_assumptions_are_valid() {
        validate_assumptions(&Assumptions::default()).unwrap();
        validate_trip_budget(&TripBudget::default()).unwrap();
    }

    #[test]
    fn zero_nights_is_rejected() {
        let mut a = Assumptions::default();
        a.assumed_nights.kuala_lumpur = 0;
        assert_eq!(
            validate_assumptions(&a),
            Err(ValidationError::ZeroNights(Destination::KualaLumpur))
        );
    }

    #[test]
    fn set_amount_edits_one_field() {
        let mut a = Assumptions::default();
        a.set_amount("accommodation.bali", Decimal::new(720, 0)).unwrap();
        a.set_amount("scenario3.qatarBundle", Decimal::new(300, 0)).unwrap();
        assert_eq!(a.accommodation.bali, Decimal::new(720, 0));
        assert_eq!(a.scenario3.qatar_bundle, Decimal::new(300, 0));
        assert_eq!(a.flights, Assumptions::default().flights);
    }

    #[test]
    fn set_amount_rejects_unknown_and_read_only_paths() {
        let mut a = Assumptions::default();
        assert_eq!(
            a.set_amount("assumedNights.bali", Decimal::ONE),
            Err(ValidationError::UnknownField("assumedNights.bali".into()))
        );
        assert!(a.set_amount("flights", Decimal::ONE).is_err());
        assert!(a.set_amount("flights.lhrToDoh", Decimal::ONE).is_err());
        assert_eq!(a, Assumptions::default());
    }

    #[test]
    fn every_editable_field_resolves() {
        let a = Assumptions::default();
        for path in Assumptions::EDITABLE_FIELDS {
            assert!(a.amount(path).is_some(), "{path}");
        }
        let b = TripBudget::default();
        for path in TripBudget::EDITABLE_FIELDS {
            assert!(b.amount(path).is_some(), "{path}");
        }
    }

    #[test]
    fn planner_total_days_keeps_whole_part() {
        let mut b = TripBudget::default();
        b.set_amount("totalDays", parse_amount("17.8")).unwrap();
        assert_eq!(b.total_days, 17);
        b.set_amount("dailyExpenses.food", parse_amount("42.5")).unwrap();
        assert_eq!(b.daily_expenses.food, Decimal::new(425, 1));
    }

    #[test]
    fn parse_amount_coerces_like_a_form_field() {
        assert_eq!(parse_amount("125"), Decimal::new(125, 0));
        assert_eq!(parse_amount("  £99.95 "), Decimal::new(9995, 2));
        assert_eq!(parse_amount("12.50 pp"), Decimal::new(1250, 2));
        assert_eq!(parse_amount(".5"), Decimal::new(5, 1));
        assert_eq!(parse_amount("7."), Decimal::new(7, 0));
        assert_eq!(parse_amount("+8"), Decimal::new(8, 0));
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("NaN"), Decimal::ZERO);
        assert_eq!(parse_amount("-40"), Decimal::ZERO);
        assert_eq!(parse_amount("."), Decimal::ZERO);
    }

    #[test]
    fn parse_amount_reads_exponents() {
        assert_eq!(parse_amount("1e3"), Decimal::new(1000, 0));
        assert_eq!(parse_amount("2.5E-1"), Decimal::new(25, 2));
        assert_eq!(parse_amount("1e+2 pp"), Decimal::new(100, 0));
        assert_eq!(parse_amount("4e"), Decimal::new(4, 0));
        assert_eq!(parse_amount("4e-"), Decimal::new(4, 0));
        assert_eq!(parse_amount("1e400"), Decimal::ZERO);
        assert_eq!(parse_amount("0e400"), Decimal::ZERO);
        assert_eq!(parse_amount("-1e3"), Decimal::ZERO);
    }

    #[test]
    fn amounts_above_the_ceiling_are_rejected() {
        let huge = parse_amount("50000000000000000000000000000");
        let mut a = Assumptions::default();
        assert_eq!(
            a.set_amount("flights.lhrToSin", huge),
            Err(ValidationError::AmountTooLarge("flights.lhrToSin".into()))
        );
        assert_eq!(a, Assumptions::default());
        a.set_amount("flights.lhrToSin", MAX_AMOUNT).unwrap();
        assert!(validate_assumptions(&a).is_ok());

        a.scenario3.qatar_bundle = huge;
        assert_eq!(
            validate_assumptions(&a),
            Err(ValidationError::AmountTooLarge("scenario3.qatarBundle".into()))
        );

        let mut b = TripBudget::default();
        assert!(b.set_amount("dailyExpenses.food", huge).is_err());
        assert!(b.set_amount("totalDays", huge).is_err());
        assert_eq!(b, TripBudget::default());
        b.daily_expenses.food = huge;
        assert_eq!(
            validate_trip_budget(&b),
            Err(ValidationError::AmountTooLarge("dailyExpenses.food".into()))
        );
    }

    #[test]
    fn layover_nights_contract() {
        for n in 0..=2 {
            validate_layover_extra_nights(n).unwrap();
        }
        assert_eq!(
            validate_layover_extra_nights(3),
            Err(ValidationError::LayoverNightsOutOfRange(3))
        );
    }

    proptest! {
        #[test]
        fn parse_amount_is_never_negative(raw in ".*") {
            prop_assert!(parse_amount(&raw) >= Decimal::ZERO);
        }

        #[test]
        fn parse_amount_reads_back_cents(cents in 0i64..10_000_000) {
            let d = Decimal::new(cents, 2);
            prop_assert_eq!(parse_amount(&d.to_string()), d);
        }

        #[test]
        fn edits_keep_assumptions_valid(idx in 0usize..10, cents in 0i64..1_000_000) {
            let mut a = Assumptions::default();
            let path = Assumptions::EDITABLE_FIELDS[idx];
            a.set_amount(path, Decimal::new(cents, 2)).unwrap();
            prop_assert_eq!(a.amount(path), Some(Decimal::new(cents, 2)));
            prop_assert!(validate_assumptions(&a).is_ok());
        }
    }
}
