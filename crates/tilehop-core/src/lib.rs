pub mod events;
pub mod math;
pub mod sequencer;
pub mod session;
pub mod timer;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::events::GameEvent;
    use crate::session::{Difficulty, LevelId, SessionConfig};

    /// `n` sequential level ids, `level1` through `level{n}`.
    pub fn level_ids(n: usize) -> Vec<LevelId> {
        (1..=n).map(|i| LevelId::new(format!("level{i}"))).collect()
    }

    /// Session config with a fixed seed so level order is reproducible.
    pub fn seeded_config(seed: u64) -> SessionConfig {
        SessionConfig {
            seed: Some(seed),
            difficulty: Difficulty::Normal,
            ..Default::default()
        }
    }

    /// Number of `SessionEnded` events in `events`.
    pub fn session_end_count(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::SessionEnded { .. }))
            .count()
    }

    /// Assert that no two neighbouring ids in `picks` are equal.
    pub fn assert_no_adjacent_repeats(picks: &[LevelId]) {
        for pair in picks.windows(2) {
            assert_ne!(
                pair[0], pair[1],
                "Level {} was picked twice in a row",
                pair[0]
            );
        }
    }
}
