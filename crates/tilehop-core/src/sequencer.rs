use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::session::{LevelId, SessionError};

/// What happens when every level in the catalog has been played once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillPolicy {
    /// Start a new pass over the whole catalog.
    Loop,
    /// Stop offering levels (speedrun sessions).
    Once,
}

/// Picks levels at random without replaying one until the catalog has been
/// exhausted, and never hands out the same level twice in a row unless the
/// catalog has a single entry.
#[derive(Debug, Clone)]
pub struct LevelSequencer {
    catalog: Vec<LevelId>,
    pool: Vec<LevelId>,
    last_played: Option<LevelId>,
    policy: RefillPolicy,
    rng: StdRng,
}

impl LevelSequencer {
    pub fn new(
        catalog: Vec<LevelId>,
        policy: RefillPolicy,
        seed: u64,
    ) -> Result<Self, SessionError> {
        let mut unique: Vec<LevelId> = Vec::with_capacity(catalog.len());
        for id in catalog {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            return Err(SessionError::EmptyCatalog);
        }
        Ok(Self {
            pool: unique.clone(),
            catalog: unique,
            last_played: None,
            policy,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Pick the next level. With `exclude_last_played`, the previous pick is
    /// left out of the draw whenever another candidate exists.
    ///
    /// Returns `None` only under [`RefillPolicy::Once`] after every level has
    /// been handed out.
    pub fn pick_next(&mut self, exclude_last_played: bool) -> Option<LevelId> {
        if self.pool.is_empty() {
            return None;
        }

        let skip = if exclude_last_played && self.pool.len() > 1 {
            self.last_played.as_ref()
        } else {
            None
        };
        let candidates: Vec<usize> = self
            .pool
            .iter()
            .enumerate()
            .filter(|(_, id)| Some(*id) != skip)
            .map(|(i, _)| i)
            .collect();

        let slot = candidates[self.rng.random_range(0..candidates.len())];
        let picked = self.pool.remove(slot);
        self.last_played = Some(picked.clone());

        if self.pool.is_empty() && self.policy == RefillPolicy::Loop {
            tracing::debug!(levels = self.catalog.len(), "Level pool exhausted, refilling");
            self.pool = self.catalog.clone();
        }

        Some(picked)
    }

    /// Levels still available in the current pass.
    pub fn remaining(&self) -> &[LevelId] {
        &self.pool
    }

    pub fn last_played(&self) -> Option<&LevelId> {
        self.last_played.as_ref()
    }

    pub fn catalog(&self) -> &[LevelId] {
        &self.catalog
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty()
    }
}
