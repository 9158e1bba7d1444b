//! Labware definitions: well layout, geometry and capacity.
//!
//! Definitions are static lookup data. The compiler only reads the well
//! ordering (columns of well names), each well's centre position and
//! footprint, its capacity, and whether the labware is a tiprack.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tipflow_core::{Volume, WellName};

use crate::error::DeckError;

/// Horizontal footprint of a well.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum WellShape {
    /// Round well.
    #[serde(rename_all = "camelCase")]
    Circular {
        /// Diameter in mm.
        diameter: f64,
    },
    /// Rectangular well or trough.
    #[serde(rename_all = "camelCase")]
    Rectangular {
        /// Extent along x in mm.
        x_dimension: f64,
        /// Extent along y in mm.
        y_dimension: f64,
    },
}

impl WellShape {
    /// Whether a point offset `(dx, dy)` from the well centre lies within it.
    pub fn contains(&self, dx: f64, dy: f64) -> bool {
        match *self {
            Self::Circular { diameter } => (dx * dx + dy * dy).sqrt() <= diameter / 2.0,
            Self::Rectangular {
                x_dimension,
                y_dimension,
            } => dx.abs() <= x_dimension / 2.0 && dy.abs() <= y_dimension / 2.0,
        }
    }
}

/// One well of a labware definition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellDefinition {
    /// Centre x in mm from the labware origin.
    pub x: f64,
    /// Centre y in mm from the labware origin (row A has the largest y).
    pub y: f64,
    /// Bottom z in mm.
    pub z: f64,
    /// Depth in mm.
    pub depth: f64,
    /// Capacity in µL. For tipracks this is the tip volume.
    pub total_liquid_volume: Volume,
    /// Footprint.
    #[serde(flatten)]
    pub shape: WellShape,
}

/// A labware definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareDefinition {
    /// Human-readable name.
    pub display_name: String,
    /// Columns of well names, front-to-back within a column.
    pub ordering: Vec<Vec<WellName>>,
    /// Well geometry keyed by name.
    pub wells: IndexMap<WellName, WellDefinition>,
    /// Whether this labware holds pipette tips.
    #[serde(default)]
    pub is_tiprack: bool,
}

impl LabwareDefinition {
    /// Build a regular grid of identical wells.
    ///
    /// Row letters start at `A` (back) and columns at `1` (left); `pitch`
    /// is the centre-to-centre spacing in both directions.
    pub fn grid(
        display_name: impl Into<String>,
        rows: usize,
        cols: usize,
        pitch: f64,
        template: WellDefinition,
    ) -> Self {
        let mut ordering = Vec::with_capacity(cols);
        let mut wells = IndexMap::with_capacity(rows * cols);
        for c in 0..cols {
            let mut column = Vec::with_capacity(rows);
            for r in 0..rows {
                let name = WellName::new(format!("{}{}", row_letter(r), c + 1));
                let well = WellDefinition {
                    x: template.x + pitch * c as f64,
                    y: template.y - pitch * r as f64,
                    ..template
                };
                wells.insert(name.clone(), well);
                column.push(name);
            }
            ordering.push(column);
        }
        Self {
            display_name: display_name.into(),
            ordering,
            wells,
            is_tiprack: false,
        }
    }

    /// Mark this definition as a tiprack.
    pub fn into_tiprack(mut self) -> Self {
        self.is_tiprack = true;
        self
    }

    /// Geometry of a well.
    pub fn well(&self, name: &str) -> Option<&WellDefinition> {
        self.wells.get(name)
    }

    /// Whether the definition contains `name`.
    pub fn has_well(&self, name: &str) -> bool {
        self.wells.contains_key(name)
    }

    /// Capacity of a well in µL.
    pub fn well_max_volume(&self, name: &str) -> Option<Volume> {
        self.well(name).map(|w| w.total_liquid_volume)
    }

    /// Nominal tip volume, taken from the first well. `None` for non-tipracks.
    pub fn tip_volume(&self) -> Option<Volume> {
        if !self.is_tiprack {
            return None;
        }
        self.first_well().and_then(|w| self.well_max_volume(w.as_str()))
    }

    /// The first well in column order (typically `A1`).
    pub fn first_well(&self) -> Option<&WellName> {
        self.ordering.first().and_then(|c| c.first())
    }

    /// Columns of well names.
    pub fn columns(&self) -> &[Vec<WellName>] {
        &self.ordering
    }

    /// All wells, top-to-bottom within a column and left-to-right across columns.
    pub fn wells_in_order(&self) -> impl Iterator<Item = &WellName> {
        self.ordering.iter().flatten()
    }

    /// Check internal consistency.
    pub fn validate(&self, uri: &str) -> Result<(), DeckError> {
        let invalid = |reason: String| DeckError::InvalidLabwareDefinition {
            uri: uri.to_string(),
            reason,
        };
        if self.ordering.iter().all(|c| c.is_empty()) {
            return Err(invalid("ordering is empty".into()));
        }
        for name in self.wells_in_order() {
            let Some(well) = self.well(name.as_str()) else {
                return Err(invalid(format!("ordering names unknown well '{name}'")));
            };
            if well.total_liquid_volume.is_nan() || well.total_liquid_volume < 0.0 {
                return Err(invalid(format!("well '{name}' has a negative capacity")));
            }
        }
        Ok(())
    }
}

fn row_letter(r: usize) -> String {
    let mut s = String::new();
    let mut n = r;
    loop {
        s.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_well(volume: f64) -> WellDefinition {
        WellDefinition {
            x: 14.38,
            y: 74.24,
            z: 3.0,
            depth: 10.5,
            total_liquid_volume: volume,
            shape: WellShape::Circular { diameter: 6.86 },
        }
    }

    #[test]
    fn grid_orders_columns_front_to_back() {
        let def = LabwareDefinition::grid("plate", 8, 12, 9.0, round_well(360.0));
        assert_eq!(def.columns().len(), 12);
        assert_eq!(def.columns()[0][0].as_str(), "A1");
        assert_eq!(def.columns()[0][7].as_str(), "H1");
        assert_eq!(def.columns()[11][7].as_str(), "H12");
        let b1 = def.well("B1").unwrap();
        assert!((b1.y - (74.24 - 9.0)).abs() < 1e-9);
        assert!(def.validate("plate").is_ok());
    }

    #[test]
    fn tip_volume_only_for_tipracks() {
        let plate = LabwareDefinition::grid("plate", 8, 12, 9.0, round_well(360.0));
        assert_eq!(plate.tip_volume(), None);
        let rack = plate.into_tiprack();
        assert_eq!(rack.tip_volume(), Some(360.0));
    }

    #[test]
    fn validate_rejects_unknown_ordering_entry() {
        let mut def = LabwareDefinition::grid("plate", 1, 1, 9.0, round_well(10.0));
        def.ordering[0].push("Z9".into());
        match def.validate("bad") {
            Err(DeckError::InvalidLabwareDefinition { reason, .. }) => {
                assert!(reason.contains("Z9"));
            }
            other => panic!("expected InvalidLabwareDefinition, got {other:?}"),
        }
    }

    #[test]
    fn shapes_contain_points() {
        let c = WellShape::Circular { diameter: 6.0 };
        assert!(c.contains(2.0, 2.0));
        assert!(!c.contains(3.0, 1.0));
        let r = WellShape::Rectangular {
            x_dimension: 8.0,
            y_dimension: 72.0,
        };
        assert!(r.contains(0.0, -31.5));
        assert!(!r.contains(4.5, 0.0));
    }

    #[test]
    fn definitions_deserialize_from_json() {
        let json = r#"{
            "displayName": "trough",
            "ordering": [["A1"]],
            "wells": {"A1": {"x": 10, "y": 40, "z": 2, "depth": 30,
                             "totalLiquidVolume": 15000,
                             "shape": "rectangular", "xDimension": 8.2, "yDimension": 71.2}}
        }"#;
        let def: LabwareDefinition = serde_json::from_str(json).unwrap();
        assert!(!def.is_tiprack);
        assert_eq!(def.well_max_volume("A1"), Some(15000.0));
    }
}
