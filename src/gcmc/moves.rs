use crate::error::{Error, Result};

/// Tolerance on the sum of the move fractions.
const MIXTURE_TOLERANCE: f64 = 1e-9;

/// The three trial moves of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Teleport one particle to a uniformly sampled point of the box.
    Displacement,
    /// Add a particle at a uniformly sampled point (N → N+1).
    Insertion,
    /// Remove a randomly chosen particle (N → N−1).
    Deletion,
}

impl MoveKind {
    pub const ALL: [MoveKind; 3] = [MoveKind::Displacement, MoveKind::Insertion, MoveKind::Deletion];

    pub fn index(self) -> usize {
        match self {
            MoveKind::Displacement => 0,
            MoveKind::Insertion => 1,
            MoveKind::Deletion => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoveKind::Displacement => "displacement",
            MoveKind::Insertion => "insertion",
            MoveKind::Deletion => "deletion",
        }
    }

    /// Natural log of the unclamped acceptance ratio.
    ///
    /// * displacement: `−β(E_new − E_old)`
    /// * insertion: `ln(V/(N+1)) + βμ − βE_new`
    /// * deletion: `ln(N/V) − βμ + β(E_old − E_new)`, with `E_new = 0`
    pub fn log_acceptance(self, input: &AcceptanceInput) -> f64 {
        let beta = input.beta;
        let n = input.n_before as f64;
        match self {
            MoveKind::Displacement => -beta * (input.new_energy - input.old_energy),
            MoveKind::Insertion => {
                (input.volume / (n + 1.0)).ln() + beta * input.chemical_potential
                    - beta * input.new_energy
            }
            MoveKind::Deletion => {
                (n / input.volume).ln() - beta * input.chemical_potential
                    + beta * (input.old_energy - input.new_energy)
            }
        }
    }

    /// Metropolis acceptance probability `min(1, ratio)`.
    ///
    /// Evaluated in log space: a ratio that would overflow is an
    /// unconditional accept, an undefined one (NaN) a reject.
    pub fn acceptance_probability(self, input: &AcceptanceInput) -> f64 {
        let log_acc = self.log_acceptance(input);
        if log_acc.is_nan() {
            0.0
        } else if log_acc >= 0.0 {
            1.0
        } else {
            log_acc.exp()
        }
    }
}

/// Everything an acceptance rule needs about one proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceInput {
    pub beta: f64,
    /// Zero in the canonical ensemble, where it is never read.
    pub chemical_potential: f64,
    pub volume: f64,
    /// Active particle count before the move.
    pub n_before: usize,
    pub old_energy: f64,
    pub new_energy: f64,
}

/// Selection probabilities of the three move kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveMixture {
    fractions: [f64; 3],
}

impl MoveMixture {
    /// Fractions must be non-negative and sum to one.
    pub fn new(displacement: f64, insertion: f64, deletion: f64) -> Result<Self> {
        let fractions = [displacement, insertion, deletion];
        if fractions.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(Error::config(format!(
                "move fractions must be non-negative, got {fractions:?}"
            )));
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > MIXTURE_TOLERANCE {
            return Err(Error::config(format!(
                "move mix fractions do not add to 1 (sum = {sum})"
            )));
        }
        Ok(Self { fractions })
    }

    /// Split `insert_delete` evenly between insertion and deletion.
    pub fn from_insert_delete(displacement: f64, insert_delete: f64) -> Result<Self> {
        Self::new(displacement, 0.5 * insert_delete, 0.5 * insert_delete)
    }

    pub fn displacement_only() -> Self {
        Self {
            fractions: [1.0, 0.0, 0.0],
        }
    }

    /// 60% displacement, insertion and deletion 20% each.
    pub fn grand_canonical_default() -> Self {
        Self {
            fractions: [0.6, 0.2, 0.2],
        }
    }

    pub fn fraction(&self, kind: MoveKind) -> f64 {
        self.fractions[kind.index()]
    }

    /// Whether the mixture can change the particle count.
    pub fn changes_particle_count(&self) -> bool {
        self.fraction(MoveKind::Insertion) > 0.0 || self.fraction(MoveKind::Deletion) > 0.0
    }

    /// Map a uniform draw in `[0, 1)` onto a move kind through the cumulative
    /// thresholds displacement → insertion → deletion.
    ///
    /// Kinds with a zero fraction are never returned, even when rounding
    /// leaves the last threshold slightly below one.
    pub fn select(&self, u: f64) -> MoveKind {
        let mut threshold = 0.0;
        let mut last_enabled = MoveKind::Displacement;
        for kind in MoveKind::ALL {
            let fraction = self.fraction(kind);
            if fraction <= 0.0 {
                continue;
            }
            threshold += fraction;
            last_enabled = kind;
            if u < threshold {
                return kind;
            }
        }
        last_enabled
    }
}

/// Attempt/accept counters per move kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveStatistics {
    attempts: [u64; 3],
    accepts: [u64; 3],
    /// Insertions turned away because every slot was occupied.
    pub capacity_rejections: u64,
}

impl MoveStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: MoveKind, accepted: bool) {
        self.attempts[kind.index()] += 1;
        if accepted {
            self.accepts[kind.index()] += 1;
        }
    }

    pub fn attempts(&self, kind: MoveKind) -> u64 {
        self.attempts[kind.index()]
    }

    pub fn accepts(&self, kind: MoveKind) -> u64 {
        self.accepts[kind.index()]
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.iter().sum()
    }

    /// Accepted over attempted, zero before the first attempt.
    pub fn acceptance_ratio(&self, kind: MoveKind) -> f64 {
        match self.attempts(kind) {
            0 => 0.0,
            attempts => self.accepts(kind) as f64 / attempts as f64,
        }
    }

    /// Ratios in displacement, insertion, deletion order.
    pub fn acceptance_ratios(&self) -> [f64; 3] {
        MoveKind::ALL.map(|kind| self.acceptance_ratio(kind))
    }
}
