//! Strategy reconciliation
//!
//! Picks the strategy with the greatest summed day total as authoritative,
//! then backfills any base/option/award category the winner is missing with
//! the largest value found for that category in the other strategies.

use super::strategies::{BASE_KEY, PeriodMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The four strategies in reconciliation order. Ties between equal totals
/// resolve in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    DateRanges,
    DurationWords,
    Multiplier,
    CatchAll,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::DateRanges => write!(f, "date ranges"),
            Strategy::DurationWords => write!(f, "duration words"),
            Strategy::Multiplier => write!(f, "multiplier words"),
            Strategy::CatchAll => write!(f, "catch-all"),
        }
    }
}

/// Raw per-strategy record sets, kept whole for audit output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyRecords {
    pub duration_words: PeriodMap,
    pub date_ranges: PeriodMap,
    pub multiplier: PeriodMap,
    pub catch_all: PeriodMap,
}

/// Per-category day tallies for one designator-aware strategy.
#[derive(Debug, Default, Clone, Copy)]
struct CategoryTally {
    total: i64,
    base: Option<i64>,
    options: Option<i64>,
    awards: Option<i64>,
}

fn tally(periods: &PeriodMap) -> CategoryTally {
    let mut tally = CategoryTally::default();
    for (key, record) in periods {
        tally.total += record.days;
        if key == BASE_KEY {
            tally.base = Some(record.days);
        } else if key.to_lowercase().contains("option") {
            tally.options = Some(tally.options.unwrap_or(0) + record.days);
        } else {
            tally.awards = Some(tally.awards.unwrap_or(0) + record.days);
        }
    }
    tally
}

/// Reconcile the four strategies to one scalar day count.
///
/// Returns `None` when every strategy total is zero: "not found" is distinct
/// from "found, zero days".
pub(crate) fn reconcile(records: &StrategyRecords) -> (Option<i64>, Option<Strategy>) {
    let tallies = [
        tally(&records.date_ranges),
        tally(&records.duration_words),
        tally(&records.multiplier),
    ];
    // the catch-all has no designator context: only its single largest match
    // serves, as a last-resort upper bound
    let catch_all_days = records
        .catch_all
        .values()
        .map(|record| record.days)
        .max()
        .unwrap_or(0);

    let totals = [
        tallies[0].total,
        tallies[1].total,
        tallies[2].total,
        catch_all_days,
    ];
    let max_index = totals
        .iter()
        .enumerate()
        .max_by(|(a_idx, a), (b_idx, b)| a.cmp(b).then(b_idx.cmp(a_idx)))
        .map(|(index, _)| index)
        .unwrap_or(0);
    let mut days = totals[max_index];

    if days == 0 {
        debug!("all strategy totals are zero; reporting duration as unset");
        return (None, None);
    }

    let winner = match max_index {
        0 => Strategy::DateRanges,
        1 => Strategy::DurationWords,
        2 => Strategy::Multiplier,
        _ => Strategy::CatchAll,
    };
    debug!("using day total from {winner}: {days}");

    // backfill categories the winning strategy is missing with the largest
    // value any other strategy found for them
    if winner != Strategy::CatchAll {
        let winning = tallies[max_index];
        if winning.base.is_none() {
            if let Some(base) = tallies.iter().filter_map(|t| t.base).max() {
                debug!("{winner} had no base period; adding {base} days from another strategy");
                days += base;
            }
        }
        if winning.options.is_none() {
            if let Some(options) = tallies.iter().filter_map(|t| t.options).max() {
                debug!(
                    "{winner} had no option periods; adding {options} days from another strategy"
                );
                days += options;
            }
        }
        if winning.awards.is_none() {
            if let Some(awards) = tallies.iter().filter_map(|t| t.awards).max() {
                debug!("{winner} had no award terms; adding {awards} days from another strategy");
                days += awards;
            }
        }
    }

    (Some(days), Some(winner))
}
