use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::merge::types::{FeatureTable, ScoredLawEvent, StateYearFeatures, StateYearGrid};
use crate::merge::utility::class_column_name;

/// Running totals for one state while sweeping its years.
#[derive(Default)]
struct Accumulator<'a> {
    features: StateYearFeatures,
    classes: BTreeSet<&'a str>,
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, scored: &'a ScoredLawEvent) {
        let f = &mut self.features;
        let score = i64::from(scored.score);

        f.law_strength_score += score;
        match scored.score {
            1 => f.restrictive_laws += 1,
            -1 => f.permissive_laws += 1,
            _ => {}
        }
        f.total_law_changes += 1;

        self.classes.insert(&scored.event.law_class);
        f.unique_law_classes = self.classes.len() as u32;

        *f.class_strength
            .entry(class_column_name(&scored.event.law_class))
            .or_default() += score;
    }

    fn is_empty(&self) -> bool {
        self.features.total_law_changes == 0
    }
}

/// Expands scored events over the grid and aggregates them per state-year.
///
/// An event is in force for every grid year on or after its effective year;
/// an event without an effective year is in force for every year of its
/// state. Events are sorted per state (undated first) and swept once against
/// the state's ascending years, so each cell sees the cumulative total.
///
/// Cells with nothing in force are left out of the result, which is what
/// later distinguishes "no law data" from a net score of zero.
pub fn aggregate_features(grid: &StateYearGrid, events: &[ScoredLawEvent]) -> FeatureTable {
    let mut by_state: BTreeMap<&str, Vec<&ScoredLawEvent>> = BTreeMap::new();
    for scored in events {
        by_state
            .entry(scored.event.state_name.as_str())
            .or_default()
            .push(scored);
    }
    for state_events in by_state.values_mut() {
        state_events.sort_by_key(|s| s.event.effective_year);
    }

    let mut table = FeatureTable::default();

    for (state, years) in grid.states() {
        let Some(state_events) = by_state.get(state) else {
            continue;
        };

        let mut acc = Accumulator::default();
        let mut pending = state_events.iter().peekable();

        for &year in years {
            while let Some(scored) = pending.next_if(|s| in_force(s.event.effective_year, year)) {
                acc.add(*scored);
            }
            if acc.is_empty() {
                continue;
            }

            table
                .class_columns
                .extend(acc.features.class_strength.keys().cloned());
            table
                .cells
                .insert((state.to_string(), year), acc.features.clone());
        }
    }

    debug!(
        cells = table.cells.len(),
        class_columns = table.class_columns.len(),
        "Aggregated law features"
    );
    table
}

/// `true` when a law with the given effective year applies to `year`.
pub fn in_force(effective_year: Option<i32>, year: i32) -> bool {
    effective_year.is_none_or(|effective| effective <= year)
}
