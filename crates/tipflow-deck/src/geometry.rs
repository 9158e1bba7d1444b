//! Tip-to-well geometry for multi-channel pipettes.
//!
//! A multi-channel pipette's primary nozzle sits over the named well and
//! the remaining nozzles follow at a fixed 9 mm pitch: eight nozzles run
//! front-to-back in one column, ninety-six form an 8 x 12 block. Each
//! nozzle lands in whichever well contains its centre, so a standard plate
//! maps one tip per well while a trough maps every tip into the same well.

use smallvec::SmallVec;
use tipflow_core::WellName;

use crate::labware::LabwareDefinition;

/// Centre-to-centre nozzle spacing in mm.
pub const NOZZLE_PITCH_MM: f64 = 9.0;

/// Wells under each tip, indexed by tip, for `channels` engaged nozzles
/// with the primary nozzle over `primary_well`.
///
/// Returns `None` if the primary well is unknown or any nozzle falls
/// outside every well.
///
/// # Examples
///
/// ```
/// use tipflow_deck::{wells_for_tips, LabwareDefinition, WellDefinition, WellShape};
///
/// let well = WellDefinition {
///     x: 14.38, y: 74.24, z: 1.0, depth: 10.0, total_liquid_volume: 200.0,
///     shape: WellShape::Circular { diameter: 6.0 },
/// };
/// let plate = LabwareDefinition::grid("plate", 8, 12, 9.0, well);
/// let wells = wells_for_tips(&plate, "A3", 8).unwrap();
/// assert_eq!(wells.len(), 8);
/// assert_eq!(wells[7].as_str(), "H3");
/// ```
pub fn wells_for_tips(
    def: &LabwareDefinition,
    primary_well: &str,
    channels: usize,
) -> Option<SmallVec<[WellName; 8]>> {
    let primary = def.well(primary_well)?;
    if channels <= 1 {
        return Some(SmallVec::from_elem(WellName::from(primary_well), 1));
    }

    let (rows, cols) = if channels == 96 { (8, 12) } else { (channels, 1) };
    // Nozzles centre on a well wide enough to hold the whole block along an
    // axis; otherwise the primary nozzle is over the well centre.
    let half_y = NOZZLE_PITCH_MM * (rows - 1) as f64 / 2.0;
    let half_x = NOZZLE_PITCH_MM * (cols - 1) as f64 / 2.0;
    let y0 = if primary.shape.contains(0.0, half_y) {
        primary.y + half_y
    } else {
        primary.y
    };
    let x0 = if cols > 1 && primary.shape.contains(half_x, 0.0) {
        primary.x - half_x
    } else {
        primary.x
    };

    let mut out = SmallVec::with_capacity(channels);
    for c in 0..cols {
        for r in 0..rows {
            let x = x0 + NOZZLE_PITCH_MM * c as f64;
            let y = y0 - NOZZLE_PITCH_MM * r as f64;
            out.push(well_at(def, x, y)?.clone());
        }
    }
    Some(out)
}

/// The well whose footprint contains the point `(x, y)`.
pub fn well_at(def: &LabwareDefinition, x: f64, y: f64) -> Option<&WellName> {
    def.wells
        .iter()
        .find(|(_, w)| w.shape.contains(x - w.x, y - w.y))
        .map(|(name, _)| name)
}

/// Whether every tip of a multi-channel pipette lands in one shared well.
pub fn is_single_well_for_all_tips(wells: &[WellName]) -> bool {
    wells.windows(2).all(|w| w[0] == w[1])
}
