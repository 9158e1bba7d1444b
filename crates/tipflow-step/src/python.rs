//! Python API source fragments.
//!
//! Creators attach a fragment only when every entity they touch has a
//! Python variable name; a missing name makes the whole fragment `None`,
//! and [`reduce_command_creators`](crate::reduce_command_creators) then
//! drops the fragment for the enclosing sequence.

use tipflow_core::{Volume, WellLocation, WellOrigin};
use tipflow_deck::InvariantContext;

/// Python variable of a pipette.
pub fn pipette(ctx: &InvariantContext, id: &str) -> Option<String> {
    ctx.pipette(id)?.python_name.clone()
}

/// Python variable of a labware.
pub fn labware(ctx: &InvariantContext, id: &str) -> Option<String> {
    ctx.labware(id)?.python_name.clone()
}

/// Python variable of a module.
pub fn module(ctx: &InvariantContext, id: &str) -> Option<String> {
    ctx.module(id)?.python_name.clone()
}

/// Python variable of a trash bin or waste chute.
pub fn equipment(ctx: &InvariantContext, id: &str) -> Option<String> {
    ctx.equipment(id)?.python_name.clone()
}

/// `plate["A1"]`.
pub fn well(ctx: &InvariantContext, labware_id: &str, well: &str) -> Option<String> {
    Some(format!("{}[\"{well}\"]", labware(ctx, labware_id)?))
}

/// `plate["A1"].bottom(z=1)` and friends.
pub fn location(
    ctx: &InvariantContext,
    labware_id: &str,
    well_name: &str,
    at: &WellLocation,
) -> Option<String> {
    let base = well(ctx, labware_id, well_name)?;
    let method = match at.origin {
        WellOrigin::Top => "top",
        WellOrigin::Bottom => "bottom",
        WellOrigin::Center => "center",
    };
    let mut out = if at.origin == WellOrigin::Center {
        format!("{base}.center()")
    } else {
        format!("{base}.{method}(z={})", number(at.offset.z))
    };
    if at.offset.x != 0.0 || at.offset.y != 0.0 {
        out = format!(
            "{out}.move(types.Point(x={}, y={}))",
            number(at.offset.x),
            number(at.offset.y)
        );
    }
    Some(out)
}

/// A Python list of well references.
pub fn well_list(ctx: &InvariantContext, labware_id: &str, wells: &[&str]) -> Option<String> {
    let items: Option<Vec<String>> = wells.iter().map(|w| well(ctx, labware_id, w)).collect();
    Some(format!("[{}]", items?.join(", ")))
}

/// Shortest decimal rendering of a number: `50`, `12.5`.
pub fn number(v: Volume) -> String {
    format!("{v}")
}

/// A Python string literal.
pub fn string(s: &str) -> String {
    format!("{s:?}")
}
