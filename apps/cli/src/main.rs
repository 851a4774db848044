#![deny(warnings)]

//! Headless trip planner: compare budget scenarios, edit assumptions and
//! the planner budget, and print the itinerary.

mod config;

use anyhow::{bail, Context, Result};
use config::PlannerConfig;
use persistence::{AssumptionsRepository, FileStore, TripBudgetRepository};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trip_budget::{
    compare_scenarios, format_currency, planner_totals, AppliesTo, CostPair, ScenarioId,
    ScenarioView,
};
use trip_core::itinerary::{self, EventKind, ItineraryEvent};
use trip_core::{parse_amount, validate_layover_extra_nights, Assumptions, TripBudget};

const USAGE: &str = "usage: trip-planner [--config PATH] [--store PATH] [--extend-nights N] \
[--layover-nights N] [--json] <scenarios [1|2|3]|set FIELD VALUE|reset|fields|budget [set FIELD VALUE|reset|fields]|itinerary|version>";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    store: Option<PathBuf>,
    extend_nights: Option<u32>,
    layover_nights: Option<u32>,
    json: bool,
    command: Vec<String>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => out.config = it.next().map(PathBuf::from),
            "--store" => out.store = it.next().map(PathBuf::from),
            "--extend-nights" => out.extend_nights = Some(parse_count(it.next(), &arg)?),
            "--layover-nights" => out.layover_nights = Some(parse_count(it.next(), &arg)?),
            "--json" => out.json = true,
            "-h" | "--help" => bail!(USAGE),
            _ => out.command.push(arg),
        }
    }
    Ok(out)
}

fn parse_count(value: Option<String>, flag: &str) -> Result<u32> {
    let value = value.with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .with_context(|| format!("{flag}: '{value}' is not a whole number"))
}

type Rendered = std::result::Result<String, std::fmt::Error>;

fn render_scenarios(views: &[ScenarioView]) -> Rendered {
    let mut out = String::new();
    for v in views {
        let r = &v.result;
        writeln!(out, "Scenario {}: {}", v.number, v.title)?;
        let mut row = |label: &str, pair: CostPair, note: &str| {
            writeln!(
                out,
                "  {label:<14} {:>8} pp  {:>8} couple{note}",
                format_currency(pair.per_person),
                format_currency(pair.for_couple)
            )
        };
        row("flights", r.flights, "")?;
        row("accommodation", r.accommodation, "")?;
        if let Some(label) = r.other.label {
            let other = CostPair {
                per_person: r.other.per_person,
                for_couple: r.other.for_couple,
            };
            row("other", other, &format!("  ({label})"))?;
        }
        row("total", r.total, "")?;
        if v.id != ScenarioId::Baseline {
            let delta = CostPair {
                per_person: v.delta.per_person,
                for_couple: v.delta.for_couple,
            };
            row("vs baseline", delta, "")?;
        }
        if let Some(refund) = r.refund {
            writeln!(
                out,
                "  refund         {:>8} pp  (not counted in total)",
                format_currency(refund.per_person)
            )?;
        }
        for item in r.breakdown.iter() {
            let scope = match item.applies_to {
                AppliesTo::PerPerson => "pp",
                AppliesTo::PerCouple => "couple",
            };
            let mut notes = Vec::new();
            if item.is_replacement {
                notes.push("replacement".to_string());
            }
            if item.date_changed {
                notes.push(match item.new_date_label() {
                    Some(day) => format!("moved to {day}"),
                    None => "date changed".to_string(),
                });
            }
            if let Some(n) = item.nights {
                notes.push(format!("{n} night{}", if n == 1 { "" } else { "s" }));
            }
            writeln!(
                out,
                "    {:<20} {:>8} {:<6} {}",
                item.key,
                format_currency(item.amount),
                scope,
                notes.join(", ")
            )?;
        }
        writeln!(out, "  {}", v.narrative)?;
        writeln!(out)?;
    }
    Ok(out)
}

fn render_fields(fields: &[&str], value: impl Fn(&str) -> Option<rust_decimal::Decimal>) -> Rendered {
    let mut out = String::new();
    for f in fields {
        let v = value(f).unwrap_or_default();
        writeln!(out, "{f:<30} {}", v.normalize())?;
    }
    Ok(out)
}

fn render_budget(b: &TripBudget) -> Rendered {
    let t = planner_totals(b);
    let mut out = String::new();
    for (label, pair) in [
        ("flights", t.flights),
        ("accommodation", t.accommodation),
        ("daily expenses", t.daily_expenses),
        ("total", t.total),
    ] {
        writeln!(
            out,
            "{label:<15} {:>8} pp  {:>8} couple",
            format_currency(pair.per_person),
            format_currency(pair.for_couple)
        )?;
    }
    writeln!(out, "over {} days", b.total_days)?;
    Ok(out)
}

fn render_itinerary(events: &[ItineraryEvent]) -> Rendered {
    let mut out = String::new();
    for e in events {
        let detail = match &e.kind {
            EventKind::Flight {
                flight_number,
                time,
                duration,
            } => format!("{flight_number} · {time} · {duration}"),
            EventKind::Arrival => String::new(),
            EventKind::Stay { nights } => {
                format!("{nights} night{}", if *nights == 1 { "" } else { "s" })
            }
            EventKind::Layover { duration } => duration.to_string(),
        };
        writeln!(out, "{:<10} {:<24} {detail}", e.date_label(), e.label)?;
    }
    writeln!(out, "{} nights booked", itinerary::total_nights(events))?;
    Ok(out)
}

/// Compute all scenarios, keeping only `only` when a number was given.
fn run_scenarios(
    a: &Assumptions,
    cfg: &PlannerConfig,
    only: Option<ScenarioId>,
    json: bool,
) -> Result<()> {
    let mut views = compare_scenarios(a, cfg.scenario_nights())?;
    if let Some(id) = only {
        views.retain(|v| v.id == id);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        print!("{}", render_scenarios(&views)?);
    }
    Ok(())
}

fn parse_scenario(raw: &str) -> Result<ScenarioId> {
    let n: u8 = raw
        .parse()
        .with_context(|| format!("'{raw}' is not a scenario number"))?;
    Ok(ScenarioId::try_from(n)?)
}

fn run_budget(store: FileStore, rest: &[String], json: bool) -> Result<()> {
    let mut repo = TripBudgetRepository::new(store);
    let mut budget = repo.load();
    match rest {
        [] => {}
        [cmd] if cmd == "reset" => budget = repo.reset()?,
        [cmd] if cmd == "fields" => {
            print!("{}", render_fields(&TripBudget::EDITABLE_FIELDS, |f| budget.amount(f))?);
            return Ok(());
        }
        [cmd, field, value] if cmd == "set" => {
            budget.set_amount(field, parse_amount(value))?;
            repo.save(&budget)?;
            info!(%field, "planner budget updated");
        }
        _ => bail!(USAGE),
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&planner_totals(&budget))?);
    } else {
        print!("{}", render_budget(&budget)?);
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut cfg = PlannerConfig::load(args.config.as_deref())?;
    if let Some(p) = args.store {
        cfg.store_path = p;
    }
    if let Some(n) = args.extend_nights {
        cfg.extend_stay_nights = n;
    }
    if let Some(n) = args.layover_nights {
        validate_layover_extra_nights(n)?;
        cfg.layover_extra_nights = n;
    }
    info!(store = %cfg.store_path.display(), command = ?args.command, "starting CLI");

    let command: Vec<&str> = args.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["itinerary"] => {
            print!("{}", render_itinerary(&itinerary::timeline())?);
            return Ok(());
        }
        ["version"] => {
            println!(
                "trip-planner {} ({} built {})",
                env!("CARGO_PKG_VERSION"),
                env!("GIT_SHA"),
                env!("BUILD_DATE")
            );
            return Ok(());
        }
        _ => {}
    }

    let store = FileStore::open(&cfg.store_path)
        .with_context(|| format!("opening store {}", cfg.store_path.display()))?;
    if command.first() == Some(&"budget") {
        return run_budget(store, &args.command[1..], args.json);
    }

    let mut repo = AssumptionsRepository::new(store);
    let mut assumptions = repo.load();
    let mut only = None;
    match command.as_slice() {
        [] | ["scenarios"] => {}
        ["scenarios", n] => only = Some(parse_scenario(n)?),
        ["set", field, value] => {
            assumptions.set_amount(field, parse_amount(value))?;
            repo.save(&assumptions)?;
            info!(%field, "assumption updated");
        }
        ["reset"] => assumptions = repo.reset()?,
        ["fields"] => {
            print!(
                "{}",
                render_fields(&Assumptions::EDITABLE_FIELDS, |f| assumptions.amount(f))?
            );
            return Ok(());
        }
        _ => bail!(USAGE),
    }
    run_scenarios(&assumptions, &cfg, only, args.json)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(parse_args(std::env::args().skip(1))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_budget::ScenarioNights;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_flags_and_command() {
        let a = args(&["--store", "x.json", "--layover-nights", "2", "set", "flights.lhrToSin", "300"])
            .unwrap();
        assert_eq!(a.store, Some(PathBuf::from("x.json")));
        assert_eq!(a.layover_nights, Some(2));
        assert_eq!(a.command, ["set", "flights.lhrToSin", "300"]);
        assert!(!a.json);
    }

    #[test]
    fn rejects_bad_counts() {
        assert!(args(&["--extend-nights", "three"]).is_err());
        assert!(args(&["--extend-nights"]).is_err());
    }

    #[test]
    fn scenario_table_shows_totals_and_narratives() {
        let views = compare_scenarios(&Assumptions::default(), ScenarioNights::default()).unwrap();
        let text = render_scenarios(&views).unwrap();
        assert!(text.contains("Scenario 1: Keep current plan"));
        assert!(text.contains("£1163"));
        assert!(text.contains("£2326"));
        assert!(text.contains("moved to 13 Apr"));
        assert!(text.contains("Qatar Bundle"));
        assert!(text.contains("This costs £305 more per person"));
    }

    #[test]
    fn budget_and_itinerary_render() {
        let text = render_budget(&TripBudget::default()).unwrap();
        assert!(text.contains("£2658"));
        assert!(text.contains("over 15 days"));
        let text = render_itinerary(&itinerary::timeline()).unwrap();
        assert!(text.contains("07-14 Apr"));
        assert!(text.contains("BA11 · 19:35 - 16:05+1 · 13h 30m"));
        assert!(text.ends_with("14 nights booked\n"));
    }

    #[test]
    fn set_persists_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("planner.json");
        let config = dir.path().join("planner.yaml");
        std::fs::write(&config, "").unwrap();
        let base = |cmd: &[&str]| {
            let mut v = vec!["--config", config.to_str().unwrap(), "--store", store.to_str().unwrap()];
            v.extend_from_slice(cmd);
            args(&v).unwrap()
        };
        run(base(&["set", "scenario2.newSinToLhr", "£199.50"])).unwrap();
        let repo = AssumptionsRepository::new(FileStore::open(&store).unwrap());
        assert_eq!(repo.load().scenario2.new_sin_to_lhr, rust_decimal::Decimal::new(19950, 2));

        run(base(&["set", "flights.sinToKul", "oops"])).unwrap();
        let repo = AssumptionsRepository::new(FileStore::open(&store).unwrap());
        assert_eq!(repo.load().flights.sin_to_kul, rust_decimal::Decimal::ZERO);

        assert!(run(base(&["set", "assumedNights.bali", "0"])).is_err());
        assert!(run(base(&["--layover-nights", "5", "scenarios"])).is_err());
        run(base(&["reset"])).unwrap();
        let repo = AssumptionsRepository::new(FileStore::open(&store).unwrap());
        assert_eq!(repo.load(), Assumptions::default());
    }

    #[test]
    fn oversized_amount_is_refused_and_later_runs_still_work() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("planner.json");
        let config = dir.path().join("planner.yaml");
        std::fs::write(&config, "").unwrap();
        let base = |cmd: &[&str]| {
            let mut v = vec!["--config", config.to_str().unwrap(), "--store", store.to_str().unwrap()];
            v.extend_from_slice(cmd);
            args(&v).unwrap()
        };
        let huge = "50000000000000000000000000000";
        assert!(run(base(&["set", "flights.lhrToSin", huge])).is_err());
        assert!(run(base(&["budget", "set", "dailyExpenses.food", huge])).is_err());
        let repo = AssumptionsRepository::new(FileStore::open(&store).unwrap());
        assert_eq!(repo.load(), Assumptions::default());
        run(base(&["scenarios"])).unwrap();
        run(base(&["budget"])).unwrap();

        // A record written by hand with an oversized amount loads as defaults.
        let blob = serde_json::json!({ "budget_assumptions": serde_json::to_string(
            &serde_json::json!({
                "flights": { "lhrToSin": 5e28, "sinToLhr": 125, "sinToKul": 60, "kulToDps": 46, "dpsToSin": 70 },
                "accommodation": { "singapore": 300, "kualaLumpur": 200, "bali": 600 },
                "assumedNights": { "singapore": 3, "kualaLumpur": 3, "bali": 5 },
                "scenario2": { "newSinToLhr": 250 },
                "scenario3": { "qatarBundle": 280 }
            })
        ).unwrap() });
        std::fs::write(&store, blob.to_string()).unwrap();
        run(base(&["scenarios"])).unwrap();
    }

    #[test]
    fn scenarios_can_be_selected_by_number() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("planner.json");
        let config = dir.path().join("planner.yaml");
        std::fs::write(&config, "").unwrap();
        let base = |cmd: &[&str]| {
            let mut v = vec!["--config", config.to_str().unwrap(), "--store", store.to_str().unwrap()];
            v.extend_from_slice(cmd);
            args(&v).unwrap()
        };
        run(base(&["scenarios", "3"])).unwrap();
        assert!(run(base(&["scenarios", "4"])).is_err());
        assert!(run(base(&["scenarios", "two"])).is_err());
        assert_eq!(parse_scenario("2").unwrap(), ScenarioId::ExtendStay);
    }
}
