use serde::{Deserialize, Serialize};

/// Evaluation strategies that can gate a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationMode {
    /// Flag is disabled for everyone. Exclusive with every other mode.
    Off,
    /// Flag is enabled for everyone.
    On,
    /// Gated by an [`ActivationSchedule`](super::ActivationSchedule).
    Scheduled,
    /// Gated by a [`TimeZoneWindow`](super::TimeZoneWindow).
    TimeWindow,
    /// Gated by the user rollout percentage.
    UserRolloutPercentage,
    /// Gated by the user allow/block lists.
    UserTargeted,
    /// Gated by the tenant rollout percentage.
    TenantRolloutPercentage,
    /// Gated by the tenant allow/block lists.
    TenantTargeted,
    /// Attribute targeting rules select a variation.
    TargetingRules,
}

impl EvaluationMode {
    /// Every mode, in declaration order.
    pub const ALL: [EvaluationMode; 9] = [
        EvaluationMode::Off,
        EvaluationMode::On,
        EvaluationMode::Scheduled,
        EvaluationMode::TimeWindow,
        EvaluationMode::UserRolloutPercentage,
        EvaluationMode::UserTargeted,
        EvaluationMode::TenantRolloutPercentage,
        EvaluationMode::TenantTargeted,
        EvaluationMode::TargetingRules,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// The set of evaluation modes active on a flag.
///
/// `Off` is mutually exclusive with every other mode and the set is never empty: it falls back to
/// `{Off}`. Serialized as a list of modes; deserialization replays [`add_mode`] for every entry,
/// so the invariant holds for any input.
///
/// [`add_mode`]: EvaluationModeSet::add_mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<EvaluationMode>", into = "Vec<EvaluationMode>")]
pub struct EvaluationModeSet {
    bits: u16,
}

impl Default for EvaluationModeSet {
    fn default() -> Self {
        EvaluationModeSet {
            bits: EvaluationMode::Off.bit(),
        }
    }
}

impl EvaluationModeSet {
    /// Create a set containing only `Off`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `mode`. Adding `Off` clears every other mode; adding anything else removes `Off`.
    pub fn add_mode(&mut self, mode: EvaluationMode) {
        if mode == EvaluationMode::Off {
            self.bits = EvaluationMode::Off.bit();
        } else {
            self.bits = (self.bits & !EvaluationMode::Off.bit()) | mode.bit();
        }
    }

    /// Remove `mode`. Removing the last mode leaves the set as `{Off}`.
    pub fn remove_mode(&mut self, mode: EvaluationMode) {
        self.bits &= !mode.bit();
        if self.bits == 0 {
            self.bits = EvaluationMode::Off.bit();
        }
    }

    pub fn contains(&self, mode: EvaluationMode) -> bool {
        self.bits & mode.bit() != 0
    }

    /// With `any = true`, return whether any of `modes` is present; otherwise whether all are.
    pub fn contains_modes(&self, modes: &[EvaluationMode], any: bool) -> bool {
        if any {
            modes.iter().any(|&mode| self.contains(mode))
        } else {
            modes.iter().all(|&mode| self.contains(mode))
        }
    }

    /// Iterate over present modes in declaration order.
    pub fn modes(&self) -> impl Iterator<Item = EvaluationMode> + '_ {
        EvaluationMode::ALL
            .into_iter()
            .filter(move |&mode| self.contains(mode))
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl From<Vec<EvaluationMode>> for EvaluationModeSet {
    fn from(modes: Vec<EvaluationMode>) -> Self {
        modes.into_iter().collect()
    }
}

impl From<EvaluationModeSet> for Vec<EvaluationMode> {
    fn from(set: EvaluationModeSet) -> Self {
        set.modes().collect()
    }
}

impl FromIterator<EvaluationMode> for EvaluationModeSet {
    fn from_iter<T: IntoIterator<Item = EvaluationMode>>(iter: T) -> Self {
        let mut set = EvaluationModeSet::default();
        for mode in iter {
            set.add_mode(mode);
        }
        set
    }
}
