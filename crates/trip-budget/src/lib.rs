#![deny(warnings)]

//! Budget scenarios: what the trip costs under three alternative plans.
//!
//! Every function here is a pure transformation of [`Assumptions`]:
//! - Per-night accommodation rates derived from committed totals
//! - The baseline plan and two alternatives built on top of it
//! - Deltas against the baseline and a one-sentence narrative per plan
//! - Totals for the committed trip as edited on the planner page
//!
//! Results are recomputed from scratch on every call and never stored.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use trip_core::{Assumptions, Destination, Leg, PerDestination, TripBudget};

/// Errors produced by the scenario calculator.
#[derive(Debug, Error, PartialEq)]
pub enum BudgetError {
    /// A destination's assumed night count is zero, so it has no per-night rate.
    #[error("cannot derive a per-night rate for {0}: assumed nights is zero")]
    ZeroNights(Destination),
    /// Scenario numbers run from 1 to 3.
    #[error("unknown scenario {0}")]
    UnknownScenario(u8),
}

/// Accommodation cost per night (for two people) at each destination.
pub type PerNightCosts = PerDestination<Decimal>;

/// Label for the bundle carried in the layover scenario's `other` block.
pub const QATAR_BUNDLE_LABEL: &str = "Qatar Bundle (SIN→DOH, 2 nights Doha, DOH→LON)";

/// Fixed narrative for the baseline plan.
pub const BASELINE_NARRATIVE: &str =
    "Keep the trip as currently planned with all existing flights and committed accommodation.";

/// The three plans under comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScenarioId {
    /// Scenario 1: keep everything as booked.
    Baseline,
    /// Scenario 2: extend Bali and rebook the return later.
    ExtendStay,
    /// Scenario 3: route home via Doha with extra nights.
    LayoverReroute,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 3] = [
        ScenarioId::Baseline,
        ScenarioId::ExtendStay,
        ScenarioId::LayoverReroute,
    ];

    /// 1-based scenario number shown to the user.
    pub fn number(self) -> u8 {
        match self {
            ScenarioId::Baseline => 1,
            ScenarioId::ExtendStay => 2,
            ScenarioId::LayoverReroute => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Keep current plan",
            ScenarioId::ExtendStay => "Extend Bali, rebook return",
            ScenarioId::LayoverReroute => "Qatar via Doha",
        }
    }
}

impl TryFrom<u8> for ScenarioId {
    type Error = BudgetError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(ScenarioId::Baseline),
            2 => Ok(ScenarioId::ExtendStay),
            3 => Ok(ScenarioId::LayoverReroute),
            other => Err(BudgetError::UnknownScenario(other)),
        }
    }
}

/// An amount seen per person and for the couple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostPair {
    pub per_person: Decimal,
    pub for_couple: Decimal,
}

impl CostPair {
    /// A per-person amount paid by both travellers.
    pub fn from_per_person(per_person: Decimal) -> Self {
        Self {
            per_person,
            for_couple: per_person * Decimal::TWO,
        }
    }

    /// A couple total split evenly.
    pub fn from_couple(for_couple: Decimal) -> Self {
        Self {
            per_person: for_couple / Decimal::TWO,
            for_couple,
        }
    }
}

/// Costs outside flights and accommodation, e.g. a bundled itinerary.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherCost {
    pub per_person: Decimal,
    pub for_couple: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
}

/// Whether a breakdown amount is paid once per traveller or once per couple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    PerPerson,
    PerCouple,
}

/// One itemized cost in a scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    #[serde(skip)]
    pub key: &'static str,
    pub amount: Decimal,
    pub applies_to: AppliesTo,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_replacement: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub date_changed: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_day_label"
    )]
    pub new_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
}

impl BreakdownItem {
    fn per_person(key: &'static str, amount: Decimal) -> Self {
        Self {
            key,
            amount,
            applies_to: AppliesTo::PerPerson,
            is_replacement: false,
            date_changed: false,
            new_date: None,
            nights: None,
        }
    }

    fn per_couple(key: &'static str, amount: Decimal) -> Self {
        Self {
            applies_to: AppliesTo::PerCouple,
            ..Self::per_person(key, amount)
        }
    }

    fn replacement(mut self) -> Self {
        self.is_replacement = true;
        self
    }

    fn rescheduled(mut self, new_date: Option<NaiveDate>) -> Self {
        self.date_changed = true;
        self.new_date = new_date;
        self
    }

    fn with_nights(mut self, nights: u32) -> Self {
        self.nights = Some(nights);
        self
    }

    /// Display label for a rescheduled date, e.g. "13 Apr".
    pub fn new_date_label(&self) -> Option<String> {
        self.new_date.map(day_label)
    }
}

fn day_label(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

fn serialize_day_label<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.serialize_str(&day_label(*d)),
        None => s.serialize_none(),
    }
}

/// Itemized costs keyed by name, in display order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Breakdown(Vec<BreakdownItem>);

impl Breakdown {
    pub fn get(&self, key: &str) -> Option<&BreakdownItem> {
        self.0.iter().find(|i| i.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreakdownItem> {
        self.0.iter()
    }

    fn push(&mut self, item: BreakdownItem) {
        self.0.push(item);
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.0.len()))?;
        for item in &self.0 {
            map.serialize_entry(item.key, item)?;
        }
        map.end()
    }
}

/// Nights added on top of the committed stays.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraNights {
    pub bali: u32,
    pub bali_cost: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub singapore: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub singapore_cost: Option<Decimal>,
    /// Informational; the nights are paid through the bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doha: Option<u32>,
}

/// A complete, immutable cost snapshot of one scenario.
///
/// `total.for_couple == flights.for_couple + accommodation.for_couple + other.for_couple`
/// and `total.per_person == flights.per_person + accommodation.per_person + other.per_person`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub flights: CostPair,
    pub accommodation: CostPair,
    pub other: OtherCost,
    pub total: CostPair,
    /// Fare recoverable from a cancelled leg. Advisory only, never part of `total`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund: Option<CostPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_nights: Option<ExtraNights>,
    pub breakdown: Breakdown,
}

impl ScenarioResult {
    fn assemble(
        flights_per_person: Decimal,
        accommodation_for_couple: Decimal,
        other_per_person: Decimal,
        other_label: Option<&'static str>,
        breakdown: Breakdown,
    ) -> Self {
        let flights = CostPair::from_per_person(flights_per_person);
        let accommodation = CostPair::from_couple(accommodation_for_couple);
        let other = CostPair::from_per_person(other_per_person);
        let total = CostPair {
            per_person: flights.per_person + accommodation.per_person + other.per_person,
            for_couple: flights.for_couple + accommodation.for_couple + other.for_couple,
        };
        Self {
            flights,
            accommodation,
            other: OtherCost {
                per_person: other.per_person,
                for_couple: other.for_couple,
                label: other_label,
            },
            total,
            refund: None,
            extra_nights: None,
            breakdown,
        }
    }
}

/// Difference of two scenarios' totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    pub per_person: Decimal,
    pub for_couple: Decimal,
}

/// Per-night rate at each destination: committed total / assumed nights.
///
/// Assumed nights are trusted constants; a zero count fails here rather than
/// leaking a meaningless rate into every scenario built from it.
pub fn per_night_costs(a: &Assumptions) -> Result<PerNightCosts, BudgetError> {
    let rate = |d: Destination| {
        a.accommodation
            .get(d)
            .checked_div(Decimal::from(a.assumed_nights.get(d)))
            .ok_or(BudgetError::ZeroNights(d))
    };
    Ok(PerDestination {
        singapore: rate(Destination::Singapore)?,
        kuala_lumpur: rate(Destination::KualaLumpur)?,
        bali: rate(Destination::Bali)?,
    })
}

fn committed_accommodation(a: &Assumptions) -> Decimal {
    Destination::ALL.iter().map(|d| a.accommodation.get(*d)).sum()
}

fn push_accommodation(breakdown: &mut Breakdown, a: &Assumptions) {
    breakdown.push(BreakdownItem::per_couple("singaporeAccom", a.accommodation.singapore));
    breakdown.push(BreakdownItem::per_couple("kualaLumpurAccom", a.accommodation.kuala_lumpur));
    breakdown.push(BreakdownItem::per_couple("baliAccom", a.accommodation.bali));
}

/// Scenario 1: keep every flight and the committed accommodation.
pub fn baseline(a: &Assumptions) -> ScenarioResult {
    let mut breakdown = Breakdown::default();
    for leg in Leg::ALL {
        breakdown.push(BreakdownItem::per_person(leg.key(), a.flights.fare(leg)));
    }
    push_accommodation(&mut breakdown, a);
    let flights: Decimal = Leg::ALL.iter().map(|l| a.flights.fare(*l)).sum();
    ScenarioResult::assemble(flights, committed_accommodation(a), Decimal::ZERO, None, breakdown)
}

/// Scenario 2: stay `extra_nights` longer in Bali, cancel the booked return
/// and fly home later on `scenario2.newSinToLhr`.
///
/// The cancelled fare is reported in `refund` and simply left out of the
/// flight sum; the replacement fare stays in `flights`.
pub fn extend_stay(a: &Assumptions, extra_nights: u32, per_night: &PerNightCosts) -> ScenarioResult {
    let f = &a.flights;
    let replacement = a.scenario2.new_sin_to_lhr;
    let extra_bali = Decimal::from(extra_nights) * per_night.bali;

    let mut breakdown = Breakdown::default();
    breakdown.push(BreakdownItem::per_person(Leg::LhrToSin.key(), f.lhr_to_sin));
    breakdown.push(BreakdownItem::per_person("newSinToLhr", replacement).replacement());
    breakdown.push(BreakdownItem::per_person(Leg::SinToKul.key(), f.sin_to_kul));
    breakdown.push(BreakdownItem::per_person(Leg::KulToDps.key(), f.kul_to_dps));
    breakdown.push(BreakdownItem::per_person(Leg::DpsToSin.key(), f.dps_to_sin).rescheduled(None));
    push_accommodation(&mut breakdown, a);
    breakdown.push(BreakdownItem::per_couple("extraBaliNights", extra_bali).with_nights(extra_nights));

    let flights = f.lhr_to_sin + replacement + f.sin_to_kul + f.kul_to_dps + f.dps_to_sin;
    let accommodation = committed_accommodation(a) + extra_bali;
    let mut result = ScenarioResult::assemble(flights, accommodation, Decimal::ZERO, None, breakdown);
    result.refund = Some(CostPair::from_per_person(f.sin_to_lhr));
    result.extra_nights = Some(ExtraNights {
        bali: extra_nights,
        bali_cost: extra_bali,
        singapore: None,
        singapore_cost: None,
        doha: None,
    });
    result
}

/// Rebooked DPS→SIN date in the layover scenario, keyed by extra Bali nights.
/// Only 0, 1 and 2 have a date.
pub fn layover_departure_date(extra_nights: u32) -> Option<NaiveDate> {
    let day = match extra_nights {
        0 => 12,
        1 => 13,
        2 => 14,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(2026, 4, day)
}

/// Scenario 3: cancel the booked return, stay `extra_nights` longer in Bali,
/// spend one more night in Singapore, then fly home on the Doha bundle.
///
/// The bundle covers transport and two nights of lodging, so it is carried
/// in `other` rather than `flights`. `extra_nights` outside 0..=2 still
/// prices but leaves `dpsToSin.newDate` unset.
pub fn layover_reroute(
    a: &Assumptions,
    extra_nights: u32,
    per_night: &PerNightCosts,
) -> ScenarioResult {
    const SINGAPORE_EXTRA: u32 = 1;
    const DOHA_NIGHTS: u32 = 2;

    let f = &a.flights;
    let bundle = a.scenario3.qatar_bundle;
    let extra_bali = Decimal::from(extra_nights) * per_night.bali;
    let extra_singapore = Decimal::from(SINGAPORE_EXTRA) * per_night.singapore;
    let new_date = layover_departure_date(extra_nights);

    let mut breakdown = Breakdown::default();
    breakdown.push(BreakdownItem::per_person(Leg::LhrToSin.key(), f.lhr_to_sin));
    breakdown.push(BreakdownItem::per_person(Leg::SinToKul.key(), f.sin_to_kul));
    breakdown.push(BreakdownItem::per_person(Leg::KulToDps.key(), f.kul_to_dps));
    breakdown.push(BreakdownItem::per_person(Leg::DpsToSin.key(), f.dps_to_sin).rescheduled(new_date));
    push_accommodation(&mut breakdown, a);
    breakdown.push(BreakdownItem::per_couple("extraBaliNights", extra_bali).with_nights(extra_nights));
    breakdown.push(
        BreakdownItem::per_couple("extraSingaporeNight", extra_singapore).with_nights(SINGAPORE_EXTRA),
    );
    breakdown.push(BreakdownItem::per_person("qatarBundle", bundle));

    let flights = f.lhr_to_sin + f.sin_to_kul + f.kul_to_dps + f.dps_to_sin;
    let accommodation = committed_accommodation(a) + extra_bali + extra_singapore;
    let mut result =
        ScenarioResult::assemble(flights, accommodation, bundle, Some(QATAR_BUNDLE_LABEL), breakdown);
    result.refund = Some(CostPair::from_per_person(f.sin_to_lhr));
    result.extra_nights = Some(ExtraNights {
        bali: extra_nights,
        bali_cost: extra_bali,
        singapore: Some(SINGAPORE_EXTRA),
        singapore_cost: Some(extra_singapore),
        doha: Some(DOHA_NIGHTS),
    });
    result
}

/// `scenario.total - baseline.total`.
pub fn delta(scenario: &ScenarioResult, baseline: &ScenarioResult) -> Delta {
    Delta {
        per_person: scenario.total.per_person - baseline.total.per_person,
        for_couple: scenario.total.for_couple - baseline.total.for_couple,
    }
}

/// Whole pounds, halves rounded up: "£1163".
pub fn format_currency(amount: Decimal) -> String {
    let rounded = (amount + Decimal::new(5, 1)).floor().normalize();
    format!("£{rounded}")
}

fn pounds(amount: Decimal) -> String {
    format!("£{}", amount.normalize())
}

fn delta_phrase(delta: &Delta) -> String {
    let whole = delta
        .per_person
        .abs()
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    if delta.per_person > Decimal::ZERO {
        format!("costs £{whole} more per person")
    } else if delta.per_person < Decimal::ZERO {
        format!("saves £{whole} per person")
    } else {
        "costs the same".to_string()
    }
}

fn plural(n: u32) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// One sentence describing what a scenario changes and its net per-person
/// impact against the baseline. The baseline's sentence is fixed.
pub fn narrative(
    id: ScenarioId,
    scenario: &ScenarioResult,
    delta: &Delta,
    extra_nights: u32,
) -> String {
    let refund = scenario.refund.map(|r| r.per_person).unwrap_or_default();
    let bali_cost = scenario
        .extra_nights
        .as_ref()
        .map(|e| e.bali_cost)
        .unwrap_or_default();
    match id {
        ScenarioId::Baseline => BASELINE_NARRATIVE.to_string(),
        ScenarioId::ExtendStay => {
            let rebooked = scenario
                .breakdown
                .get("newSinToLhr")
                .map(|i| i.amount)
                .unwrap_or_default();
            let nights = if extra_nights > 0 {
                format!(
                    ", added {extra_nights} extra Bali night{} ({} total)",
                    plural(extra_nights),
                    pounds(bali_cost)
                )
            } else {
                String::new()
            };
            format!(
                "Refunded BA return ({} pp), rebooked later return flight ({} pp){nights}. This {} vs keeping the original plan.",
                pounds(refund),
                pounds(rebooked),
                delta_phrase(delta)
            )
        }
        ScenarioId::LayoverReroute => {
            let fly_date = scenario
                .breakdown
                .get(Leg::DpsToSin.key())
                .and_then(BreakdownItem::new_date_label)
                .unwrap_or_else(|| "an unscheduled date".to_string());
            let bali = if extra_nights > 0 {
                format!(
                    "{extra_nights} extra Bali night{} ({} total) and ",
                    plural(extra_nights),
                    pounds(bali_cost)
                )
            } else {
                String::new()
            };
            format!(
                "Refunded BA return ({} pp), fly DPS→SIN on {fly_date}, add 1 night in Singapore, then route via Doha (SIN→DOH→LON + 2 nights, {} pp bundle). This adds {bali}1 extra Singapore night. This {} vs the original plan.",
                pounds(refund),
                pounds(scenario.other.per_person),
                delta_phrase(delta)
            )
        }
    }
}

/// Extra-night counts passed to the alternative scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScenarioNights {
    /// Extra Bali nights in scenario 2.
    pub extend_stay: u32,
    /// Extra Bali nights in scenario 3; 0, 1 or 2.
    pub layover: u32,
}

impl Default for ScenarioNights {
    fn default() -> Self {
        Self {
            extend_stay: 3,
            layover: 1,
        }
    }
}

impl ScenarioNights {
    pub fn for_scenario(&self, id: ScenarioId) -> u32 {
        match id {
            ScenarioId::Baseline => 0,
            ScenarioId::ExtendStay => self.extend_stay,
            ScenarioId::LayoverReroute => self.layover,
        }
    }
}

/// One scenario with everything needed to display it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioView {
    pub id: ScenarioId,
    pub number: u8,
    pub title: &'static str,
    pub result: ScenarioResult,
    pub delta: Delta,
    pub narrative: String,
}

/// Compute all three scenarios against the baseline.
pub fn compare_scenarios(
    a: &Assumptions,
    nights: ScenarioNights,
) -> Result<Vec<ScenarioView>, BudgetError> {
    let per_night = per_night_costs(a)?;
    let base = baseline(a);
    let views: Vec<ScenarioView> = ScenarioId::ALL
        .into_iter()
        .map(|id| {
            let extra = nights.for_scenario(id);
            let result = match id {
                ScenarioId::Baseline => base.clone(),
                ScenarioId::ExtendStay => extend_stay(a, extra, &per_night),
                ScenarioId::LayoverReroute => layover_reroute(a, extra, &per_night),
            };
            let d = delta(&result, &base);
            debug!(
                scenario = id.number(),
                total_pp = %result.total.per_person,
                delta_pp = %d.per_person,
                "scenario computed"
            );
            ScenarioView {
                id,
                number: id.number(),
                title: id.title(),
                narrative: narrative(id, &result, &d, extra),
                result,
                delta: d,
            }
        })
        .collect();
    Ok(views)
}

/// Totals for the committed trip on the planner page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTotals {
    pub flights: CostPair,
    pub accommodation: CostPair,
    pub daily_expenses: CostPair,
    pub total: CostPair,
}

/// Flights per person, lodging per couple, and daily spending per person
/// per day across `total_days`.
pub fn planner_totals(b: &TripBudget) -> PlannerTotals {
    let f = &b.flights;
    let a = &b.accommodation;
    let flights = CostPair::from_per_person(
        f.lhr_to_sin + f.sin_to_kul + f.kul_to_dps + f.dps_to_sin + f.sin_to_doh + f.doh_to_lgw,
    );
    let accommodation =
        CostPair::from_couple(a.singapore + a.kuala_lumpur + a.bali + a.singapore_extra);
    let daily_expenses = CostPair::from_per_person(
        (b.daily_expenses.food + b.daily_expenses.activities) * Decimal::from(b.total_days),
    );
    PlannerTotals {
        flights,
        accommodation,
        daily_expenses,
        total: CostPair {
            per_person: flights.per_person + accommodation.per_person + daily_expenses.per_person,
            for_couple: flights.for_couple + accommodation.for_couple + daily_expenses.for_couple,
        },
    }
}
