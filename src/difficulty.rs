/// Sequence length and time budget required at a given level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difficulty {
    pub sequence_length: usize,
    pub time_budget_secs: u64,
}

/// (first level, sequence length, time budget in seconds)
///
/// Increments between steps are irregular on purpose; past the last row
/// difficulty stays flat.
const STEPS: [(u32, usize, u64); 10] = [
    (1, 3, 5),
    (5, 4, 6),
    (15, 5, 8),
    (30, 6, 9),
    (50, 7, 11),
    (75, 8, 12),
    (105, 9, 14),
    (140, 10, 15),
    (145, 11, 17),
    (150, 12, 18),
];

/// Difficulty for `level`; level 0 is treated as level 1.
pub fn schedule(level: u32) -> Difficulty {
    let (_, sequence_length, time_budget_secs) = STEPS
        .iter()
        .rev()
        .find(|(threshold, _, _)| level >= *threshold)
        .copied()
        .unwrap_or(STEPS[0]);

    Difficulty {
        sequence_length,
        time_budget_secs,
    }
}

/// Levels at which difficulty steps up
pub fn thresholds() -> impl Iterator<Item = u32> {
    STEPS.iter().map(|(level, _, _)| *level)
}
