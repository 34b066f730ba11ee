//! Exercise selection policies.
//!
//! All selectors draw without replacement on the `(name, group)` key and take
//! their randomness from the caller, so a seeded RNG gives a reproducible
//! workout. Shuffles are uniform Fisher-Yates (`SliceRandom::shuffle`).
//!
//! Tabata pairing is probabilistic: it redraws a balanced selection up to
//! [`TABATA_MAX_ATTEMPTS`] times and gives up with `None` instead of looping.

use std::collections::{BTreeMap, HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::exercise::{ExerciseKey, ExercisePool, ExerciseRecord};

/// Round-robin order used by balanced selection when these groups exist.
pub const PREFERRED_CYCLE: [&str; 4] = ["upper", "legs", "core", "full"];

/// Retry budget for Tabata pairing.
pub const TABATA_MAX_ATTEMPTS: usize = 80;

/// Exercises per Tabata workout (three pairs).
pub const TABATA_EXERCISES: usize = 6;

type GroupQueues = BTreeMap<String, VecDeque<ExerciseRecord>>;

/// Draw up to `n` unique exercises, rotating across muscle groups.
///
/// Returns fewer than `n` records when the pool runs out of unique keys;
/// callers treat a short result as a failed build.
pub fn select_balanced<R: Rng + ?Sized>(
    n: usize,
    pool: &ExercisePool,
    rng: &mut R,
) -> Vec<ExerciseRecord> {
    let mut queues: GroupQueues = pool
        .by_group()
        .into_iter()
        .map(|(group, mut list)| {
            list.shuffle(rng);
            (group, VecDeque::from(list))
        })
        .collect();

    let all_groups: Vec<String> = queues.keys().cloned().collect();
    let preferred: Vec<String> = PREFERRED_CYCLE
        .iter()
        .filter(|g| queues.contains_key(**g))
        .map(|g| g.to_string())
        .collect();
    let cycle = if preferred.is_empty() {
        all_groups.clone()
    } else {
        preferred
    };

    let mut picks = Vec::with_capacity(n);
    if cycle.is_empty() {
        return picks;
    }

    let mut used: HashSet<ExerciseKey> = HashSet::new();
    for i in 0..n {
        let group = &cycle[i % cycle.len()];
        let next = take_unused(&mut queues, group, &mut used)
            .or_else(|| {
                cycle
                    .iter()
                    .find_map(|g| take_unused(&mut queues, g, &mut used))
            })
            .or_else(|| {
                all_groups
                    .iter()
                    .find_map(|g| take_unused(&mut queues, g, &mut used))
            });

        match next {
            Some(record) => picks.push(record),
            None => break,
        }
    }

    picks
}

/// Draw up to `n` unique exercises from a single group.
pub fn select_from_group<R: Rng + ?Sized>(
    n: usize,
    pool: &ExercisePool,
    group: &str,
    rng: &mut R,
) -> Vec<ExerciseRecord> {
    let mut list = pool.in_group(group);
    list.shuffle(rng);

    let mut used: HashSet<ExerciseKey> = HashSet::new();
    list.into_iter()
        .filter(|record| used.insert(record.key()))
        .take(n)
        .collect()
}

/// Six exercises arranged as the three Tabata pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabataSelection {
    pub six: Vec<ExerciseRecord>,
    pub pairs: Vec<(ExerciseRecord, ExerciseRecord)>,
}

/// Two exercises can share a Tabata set when their groups differ.
/// An empty group on either side places no constraint.
pub fn pair_is_compatible(a: &ExerciseRecord, b: &ExerciseRecord) -> bool {
    a.group.is_empty() || b.group.is_empty() || a.group != b.group
}

/// Draw six balanced exercises whose pairs `(1,2) (3,4) (5,6)` each mix groups.
pub fn select_tabata_pairs<R: Rng + ?Sized>(
    pool: &ExercisePool,
    rng: &mut R,
) -> Option<TabataSelection> {
    for attempt in 1..=TABATA_MAX_ATTEMPTS {
        let six = select_balanced(TABATA_EXERCISES, pool, rng);
        if six.len() < TABATA_EXERCISES {
            // A smaller pool never grows between attempts.
            return None;
        }

        let pairs: Vec<(ExerciseRecord, ExerciseRecord)> = six
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        if pairs.iter().all(|(a, b)| pair_is_compatible(a, b)) {
            debug!(attempt, "tabata pairs accepted");
            return Some(TabataSelection { six, pairs });
        }
    }

    debug!(attempts = TABATA_MAX_ATTEMPTS, "tabata pairing gave up");
    None
}

fn take_unused(
    queues: &mut GroupQueues,
    group: &str,
    used: &mut HashSet<ExerciseKey>,
) -> Option<ExerciseRecord> {
    let queue = queues.get_mut(group)?;
    while let Some(record) = queue.pop_front() {
        if used.insert(record.key()) {
            return Some(record);
        }
    }
    None
}
