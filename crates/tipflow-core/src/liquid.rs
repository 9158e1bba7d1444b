//! Liquid-state algebra.
//!
//! A [`LocationLiquidState`] is a sparse map from liquid id to volume for
//! one location: a well, a pipette tip, or a trash/waste-chute. The two
//! primitives [`split_liquid`] and [`merge_liquid`] are the substrate every
//! liquid-moving state update is built from.
//!
//! Both are pure. They conserve volume: splitting partitions the source
//! proportionally (topping up with [`LiquidId::air`] when more is requested
//! than the source holds), and merging sums volumes per liquid id.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::{LiquidId, Volume};

/// Sparse mapping of liquid id to volume for a single location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationLiquidState(IndexMap<LiquidId, Volume>);

impl LocationLiquidState {
    /// An empty location.
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// A location holding a single liquid.
    pub fn single(liquid: LiquidId, volume: Volume) -> Self {
        let mut map = IndexMap::with_capacity(1);
        map.insert(liquid, volume);
        Self(map)
    }

    /// A location holding only air.
    pub fn air(volume: Volume) -> Self {
        Self::single(LiquidId::air(), volume)
    }

    /// Sum of all volumes at this location, air included.
    pub fn total_volume(&self) -> Volume {
        self.0.values().sum()
    }

    /// Sum of all non-air volumes at this location.
    pub fn liquid_volume(&self) -> Volume {
        self.0
            .iter()
            .filter(|(id, _)| !id.is_air())
            .map(|(_, v)| *v)
            .sum()
    }

    /// Whether no liquid (of any kind, air included) has a positive volume here.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| *v <= 0.0)
    }

    /// Whether no liquid entry, air included, was ever recorded here.
    ///
    /// A drained well keeps its zero-volume entries and is not untouched.
    pub fn is_untouched(&self) -> bool {
        self.0.is_empty()
    }

    /// Volume of one liquid, zero if absent.
    pub fn volume_of(&self, liquid: &LiquidId) -> Volume {
        self.0.get(liquid).copied().unwrap_or(0.0)
    }

    /// Add volume of a liquid, summing with any volume already present.
    pub fn add(&mut self, liquid: LiquidId, volume: Volume) {
        *self.0.entry(liquid).or_insert(0.0) += volume;
    }

    /// Iterate over `(liquid, volume)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&LiquidId, &Volume)> {
        self.0.iter()
    }

    /// Number of liquid entries, including zero-volume ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The same location with the air entry removed.
    pub fn without_air(&self) -> Self {
        self.0
            .iter()
            .filter(|(id, _)| !id.is_air())
            .map(|(id, v)| (id.clone(), *v))
            .collect()
    }
}

impl FromIterator<(LiquidId, Volume)> for LocationLiquidState {
    fn from_iter<T: IntoIterator<Item = (LiquidId, Volume)>>(iter: T) -> Self {
        let mut state = Self::new();
        for (id, v) in iter {
            state.add(id, v);
        }
        state
    }
}

/// Result of [`split_liquid`]: what stays behind and what moves.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitLiquid {
    /// The source location after removal.
    pub source: LocationLiquidState,
    /// The removed portion.
    pub dest: LocationLiquidState,
}

/// Partition `volume` out of `source` proportionally to its contents.
///
/// - Empty source: `dest` is pure air of the requested volume and the source
///   is returned unchanged.
/// - Requested volume exceeds what the source holds: the source is zeroed and
///   `dest` receives everything plus an air remainder equal to the shortfall.
///   This models aspirating air at the bottom of a nearly-empty well; the
///   capacity checks in the command creators are what reject invalid volumes.
/// - Otherwise every liquid contributes `volume * (its share of the total)`.
///
/// # Examples
///
/// ```
/// use tipflow_core::{split_liquid, LiquidId, LocationLiquidState};
///
/// let well = LocationLiquidState::single(LiquidId::from("water"), 100.0);
/// let split = split_liquid(30.0, &well);
/// assert_eq!(split.source.total_volume(), 70.0);
/// assert_eq!(split.dest.total_volume(), 30.0);
/// ```
pub fn split_liquid(volume: Volume, source: &LocationLiquidState) -> SplitLiquid {
    let total = source.total_volume();

    if total <= 0.0 {
        return SplitLiquid {
            source: source.clone(),
            dest: LocationLiquidState::air(volume),
        };
    }

    if volume > total {
        let zeroed = source.iter().map(|(id, _)| (id.clone(), 0.0)).collect();
        let mut dest = source.clone();
        dest.add(LiquidId::air(), volume - total);
        return SplitLiquid {
            source: zeroed,
            dest,
        };
    }

    let mut remaining = LocationLiquidState::new();
    let mut moved = LocationLiquidState::new();
    for (id, v) in source.iter() {
        let portion = (v / total) * volume;
        remaining.add(id.clone(), v - portion);
        moved.add(id.clone(), portion);
    }
    SplitLiquid {
        source: remaining,
        dest: moved,
    }
}

/// Union of two locations, summing volumes for liquids present in both.
pub fn merge_liquid(a: &LocationLiquidState, b: &LocationLiquidState) -> LocationLiquidState {
    let mut merged = a.clone();
    for (id, v) in b.iter() {
        merged.add(id.clone(), *v);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-6;

    fn water(v: Volume) -> LocationLiquidState {
        LocationLiquidState::single(LiquidId::from("water"), v)
    }

    #[test]
    fn split_from_empty_is_pure_air() {
        let split = split_liquid(20.0, &LocationLiquidState::new());
        assert_eq!(split.dest, LocationLiquidState::air(20.0));
        assert_eq!(split.source, LocationLiquidState::new());
    }

    #[test]
    fn split_more_than_available_adds_air_shortfall() {
        let split = split_liquid(150.0, &water(100.0));
        assert_eq!(split.source.volume_of(&LiquidId::from("water")), 0.0);
        assert_eq!(split.dest.volume_of(&LiquidId::from("water")), 100.0);
        assert_eq!(split.dest.volume_of(&LiquidId::air()), 50.0);
    }

    #[test]
    fn split_is_proportional_across_liquids() {
        let mut source = water(60.0);
        source.add(LiquidId::from("dye"), 40.0);
        let split = split_liquid(50.0, &source);
        assert!((split.dest.volume_of(&LiquidId::from("water")) - 30.0).abs() < EPS);
        assert!((split.dest.volume_of(&LiquidId::from("dye")) - 20.0).abs() < EPS);
        assert!((split.source.volume_of(&LiquidId::from("dye")) - 20.0).abs() < EPS);
    }

    #[test]
    fn drained_location_is_empty_but_not_untouched() {
        let drained = split_liquid(100.0, &water(100.0)).source;
        assert!(drained.is_empty());
        assert!(!drained.is_untouched());
        assert!(LocationLiquidState::new().is_untouched());
    }

    #[test]
    fn merge_sums_shared_ids() {
        let mut b = water(5.0);
        b.add(LiquidId::air(), 2.0);
        let merged = merge_liquid(&water(10.0), &b);
        assert_eq!(merged.volume_of(&LiquidId::from("water")), 15.0);
        assert_eq!(merged.volume_of(&LiquidId::air()), 2.0);
        assert_eq!(merged.liquid_volume(), 15.0);
    }

    fn arb_location() -> impl Strategy<Value = LocationLiquidState> {
        prop::collection::vec((0u8..4, 0.0f64..500.0), 0..4).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(id, v)| (LiquidId::new(format!("liquid{id}")), v))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn split_conserves_volume(source in arb_location(), volume in 0.0f64..1000.0) {
            let before = source.total_volume();
            let split = split_liquid(volume, &source);
            let after = split.source.total_volume() + split.dest.total_volume();
            if before > 0.0 && volume <= before {
                prop_assert!((after - before).abs() < EPS);
            } else {
                let injected_air = if before <= 0.0 { volume } else { volume - before };
                prop_assert!((after - (before + injected_air)).abs() < EPS);
            }
            prop_assert!((split.dest.total_volume() - volume).abs() < EPS);
        }

        #[test]
        fn merge_of_split_reconstructs_total(source in arb_location(), volume in 0.0f64..1000.0) {
            let before = source.total_volume();
            let split = split_liquid(volume, &source);
            let merged = merge_liquid(&split.source, &split.dest);
            let injected_air = if before <= 0.0 { volume } else { (volume - before).max(0.0) };
            prop_assert!((merged.total_volume() - (before + injected_air)).abs() < EPS);
        }

        #[test]
        fn merge_is_commutative_in_volume(a in arb_location(), b in arb_location()) {
            let ab = merge_liquid(&a, &b);
            let ba = merge_liquid(&b, &a);
            prop_assert_eq!(ab.len(), ba.len());
            for (id, v) in ab.iter() {
                prop_assert!((ba.volume_of(id) - v).abs() < EPS);
            }
        }
    }
}
