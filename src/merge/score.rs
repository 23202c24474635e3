use tracing::debug;

use crate::merge::types::{ChangeType, Effect, LawEvent, ScoredLawEvent};

/// Score contributed by each recognized (effect, type of change) pair.
///
/// | Effect      | Change              | Score |
/// |-------------|---------------------|-------|
/// | Restrictive | Implement or Modify | +1    |
/// | Permissive  | Implement or Modify | -1    |
/// | Restrictive | Repeal              | -1    |
/// | Permissive  | Repeal              | +1    |
static SCORE_TABLE: &[(Effect, ChangeType, i8)] = &[
    (Effect::Restrictive, ChangeType::Implement, 1),
    (Effect::Restrictive, ChangeType::Modify, 1),
    (Effect::Permissive, ChangeType::Implement, -1),
    (Effect::Permissive, ChangeType::Modify, -1),
    (Effect::Restrictive, ChangeType::Repeal, -1),
    (Effect::Permissive, ChangeType::Repeal, 1),
];

/// Looks up the score for an event; any pair outside the table scores 0.
pub fn law_score(effect: Option<Effect>, change: Option<ChangeType>) -> i8 {
    let (Some(effect), Some(change)) = (effect, change) else {
        return 0;
    };
    SCORE_TABLE
        .iter()
        .find(|(e, c, _)| *e == effect && *c == change)
        .map_or(0, |(_, _, score)| *score)
}

/// Scores every event and drops the ones that score zero.
pub fn score_events(events: Vec<LawEvent>) -> Vec<ScoredLawEvent> {
    let total = events.len();
    let scored: Vec<_> = events
        .into_iter()
        .filter_map(|event| {
            let score = law_score(event.effect, event.type_of_change);
            (score != 0).then_some(ScoredLawEvent { event, score })
        })
        .collect();

    debug!(total, kept = scored.len(), dropped = total - scored.len(), "Scored law events");
    scored
}
