//! The tip-change policy as two predicates over consecutive tip uses.
//!
//! Transfer, consolidate and distribute each walk a list of aspirate
//! cycles. Each cycle is summarised as a [`TipUse`]: the well it draws
//! from and the well it first delivers to. [`change_tip_now`] looks back
//! at the previous cycle; [`will_reuse_tip`] looks ahead at the next one.
//! Both derive from the same rule, so they cannot disagree.

use tipflow_core::WellName;

use crate::args::ChangeTip;

/// The wells one aspirate cycle touches, for tip-policy decisions.
///
/// Consolidate keys a chunk by its first source well; distribute keys a
/// chunk by its first destination well.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TipUse {
    /// Well aspirated from.
    pub source: WellName,
    /// Well dispensed into; empty for trash and waste chute destinations.
    pub dest: WellName,
}

impl TipUse {
    /// A tip use from `source` to `dest`.
    pub fn new(source: impl Into<WellName>, dest: impl Into<WellName>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

/// Whether the cycle `current` starts with a fresh tip.
pub fn change_tip_now(policy: ChangeTip, previous: Option<&TipUse>, current: &TipUse) -> bool {
    match (policy, previous) {
        (ChangeTip::Never, _) => false,
        (_, None) => true,
        (ChangeTip::Always, Some(_)) => true,
        (ChangeTip::Once, Some(_)) => false,
        (ChangeTip::PerSource, Some(prev)) => prev.source != current.source,
        (ChangeTip::PerDest, Some(prev)) => prev.dest != current.dest,
    }
}

/// Whether the tip used for `current` carries over into `next`.
///
/// The last cycle never reuses its tip, except under [`ChangeTip::Never`]
/// where the tip is never discarded.
pub fn will_reuse_tip(policy: ChangeTip, current: &TipUse, next: Option<&TipUse>) -> bool {
    if policy == ChangeTip::Never {
        return true;
    }
    match next {
        Some(next) => !change_tip_now(policy, Some(current), next),
        None => false,
    }
}
