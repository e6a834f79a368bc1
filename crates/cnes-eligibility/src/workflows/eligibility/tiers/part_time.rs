use tracing::debug;

use super::super::domain::CareerEntry;
use super::accumulator::{count_of, CreditAccumulator};

pub(super) const MAX_OCCURRENCES: u32 = 4;
const MIN_PROMOTION_OCCURRENCES: usize = 2;

/// Tier-10 acceptance. A lone 10-hour registration earns nothing on its own: rows are
/// buffered per month and only enter the history once a second one shows up, after which
/// the month stays unlocked and later rows flush immediately.
pub(super) fn accept(entry: &CareerEntry, accumulator: &mut CreditAccumulator) {
    let competence = entry.competence;
    let thirty = count_of(&accumulator.tier30, &competence);
    let twenty = count_of(&accumulator.tier20, &competence);

    if thirty == 1 {
        accumulator.tier30.remove(&competence);
        accumulator.promote_to_top(competence);
        accumulator.accept_row(entry);
        debug!(%competence, "30-hour month completed by a 10-hour registration");
        return;
    }

    if twenty == 1 && thirty == 0 {
        accumulator.tier20.remove(&competence);
        accumulator.tier30.insert(competence, 1);
        accumulator.accept_row(entry);
        debug!(%competence, "20-hour month raised to 30 hours by a 10-hour registration");
        return;
    }

    if thirty > 0 || twenty > 0 || count_of(&accumulator.tier10, &competence) >= MAX_OCCURRENCES {
        return;
    }

    *accumulator.tier10.entry(competence).or_insert(0) += 1;
    let buffered = {
        let pending = accumulator.pending_tier10.entry(competence).or_default();
        pending.push(entry.clone());
        pending.len()
    };

    if buffered >= MIN_PROMOTION_OCCURRENCES
        || accumulator.promoted_tier10.contains_key(&competence)
    {
        accumulator.flush_pending_tier10(competence);
    }
}

/// Converts final Tier-10 counts into higher-tier credit and empties the Tier-10 map.
pub(super) fn consolidate(accumulator: &mut CreditAccumulator) {
    let counts = std::mem::take(&mut accumulator.tier10);

    for (competence, count) in counts {
        match count {
            count if count >= MAX_OCCURRENCES => accumulator.promote_to_top(competence),
            3 => {
                accumulator.tier30.insert(competence, 1);
            }
            2 => {
                accumulator.tier20.insert(competence, 1);
            }
            _ => debug!(%competence, "single 10-hour registration earns no credit"),
        }
    }
}
