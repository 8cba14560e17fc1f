//! Deterministic sample snapshots.
//!
//! Used by the save-runner tool and by tests to produce realistic
//! mid-playthrough snapshots from a single seed. Same seed, same snapshot.

use crate::{
    snapshot::{Snapshot, TutorialProgress},
    types::{PowerKind, CHALLENGER_COUNT, POWER_KIND_COUNT, TUTORIAL_STEP_COUNT},
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Seeded generator for plausible snapshots.
pub struct SnapshotRng {
    inner: Pcg64Mcg,
}

impl SnapshotRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.inner.gen::<f64>() < p
    }

    /// A valid, in-progress playthrough.
    pub fn snapshot(&mut self) -> Snapshot {
        let area = self.inner.gen_range(0..CHALLENGER_COUNT as i32);

        // Challengers before the current area are the ones already beaten.
        let mut challengers_defeated = [false; CHALLENGER_COUNT];
        for slot in challengers_defeated.iter_mut().take(area as usize) {
            *slot = true;
        }

        let mut power_list = [PowerKind::None; POWER_KIND_COUNT];
        for slot in power_list.iter_mut() {
            *slot = PowerKind::ALL[self.inner.gen_range(0..POWER_KIND_COUNT)];
        }

        let use_tutorial = self.chance(0.5);
        let mut cleared = [false; TUTORIAL_STEP_COUNT];
        if use_tutorial {
            for slot in cleared.iter_mut() {
                *slot = self.chance(0.6);
            }
        }

        let losses = self.inner.gen_range(0..20);
        Snapshot {
            valid: true,
            complete: false,
            use_tutorial,
            elapsed_time: self.inner.gen_range(0.0f32..7_200.0),
            score: self.inner.gen_range(0..5_000),
            wrong_answers: self.inner.gen_range(0..60),
            losses,
            recent_losses: self.inner.gen_range(0..=losses.min(3)),
            current_area_index: area,
            selected_power: PowerKind::ALL[self.inner.gen_range(0..POWER_KIND_COUNT)],
            power_list,
            challengers_defeated,
            tutorial_progress: TutorialProgress { cleared },
        }
    }
}

/// Shorthand for `SnapshotRng::new(seed).snapshot()`.
pub fn sample_snapshot(seed: u64) -> Snapshot {
    SnapshotRng::new(seed).snapshot()
}
