//! Deck slots and their N/S/E/W adjacency.
//!
//! The deck is a small rectangular grid. Each [`RobotType`] names its slots
//! differently: an OT-2 numbers them `1`..`12` from the front-left corner,
//! a Flex letters rows `A`..`D` from the back and numbers columns `1`..`3`
//! (plus staging column `4`). Both map onto `(row, col)` with row 0 at the
//! back of the deck so that "north" is always `row - 1`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tipflow_core::DeckSlot;

/// Which robot a protocol targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotType {
    /// OT-2: numbered slots, slot 12 holds the fixed trash.
    #[serde(rename = "OT-2 Standard")]
    Ot2,
    /// Flex: lettered rows, movable trash bins and waste chute.
    #[serde(rename = "OT-3 Standard")]
    Flex,
}

impl RobotType {
    const OT2_SLOTS: [&'static str; 12] =
        ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12"];
    const FLEX_SLOTS: [&'static str; 16] = [
        "D1", "D2", "D3", "C1", "C2", "C3", "B1", "B2", "B3", "A1", "A2", "A3", "A4", "B4", "C4",
        "D4",
    ];

    /// Every slot name, front-left first.
    pub fn slots(self) -> &'static [&'static str] {
        match self {
            Self::Ot2 => &Self::OT2_SLOTS,
            Self::Flex => &Self::FLEX_SLOTS,
        }
    }

    /// Position of `slot` in the canonical slot order, used to sort tipracks.
    pub fn slot_index(self, slot: &str) -> Option<usize> {
        self.slots().iter().position(|s| *s == slot)
    }

    /// Whether `slot` is a valid slot name on this robot.
    pub fn has_slot(self, slot: &str) -> bool {
        self.slot_index(slot).is_some()
    }

    /// Grid position of a slot, row 0 at the back.
    pub fn position(self, slot: &str) -> Option<SlotPosition> {
        match self {
            Self::Ot2 => {
                let n: u8 = slot.parse().ok()?;
                if !(1..=12).contains(&n) {
                    return None;
                }
                Some(SlotPosition {
                    row: 3 - (n - 1) / 3,
                    col: (n - 1) % 3,
                })
            }
            Self::Flex => {
                let mut chars = slot.chars();
                let row = match chars.next()? {
                    'A' => 0,
                    'B' => 1,
                    'C' => 2,
                    'D' => 3,
                    _ => return None,
                };
                let col = match chars.as_str() {
                    "1" => 0,
                    "2" => 1,
                    "3" => 2,
                    "4" => 3,
                    _ => return None,
                };
                Some(SlotPosition { row, col })
            }
        }
    }

    /// The slot at a grid position, if one exists.
    pub fn slot_at(self, pos: SlotPosition) -> Option<DeckSlot> {
        match self {
            Self::Ot2 => {
                if pos.row > 3 || pos.col > 2 {
                    return None;
                }
                Some(DeckSlot::new(((3 - pos.row) * 3 + pos.col + 1).to_string()))
            }
            Self::Flex => {
                let row = ['A', 'B', 'C', 'D'].get(pos.row as usize)?;
                if pos.col > 3 {
                    return None;
                }
                Some(DeckSlot::new(format!("{row}{}", pos.col + 1)))
            }
        }
    }

    /// The slot one step from `slot` in `direction`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tipflow_deck::{Direction, RobotType};
    ///
    /// let north = RobotType::Ot2.neighbour("1", Direction::North).unwrap();
    /// assert_eq!(north.as_str(), "4");
    /// assert!(RobotType::Ot2.neighbour("1", Direction::West).is_none());
    /// ```
    pub fn neighbour(self, slot: &str, direction: Direction) -> Option<DeckSlot> {
        let pos = self.position(slot)?;
        let (dr, dc) = direction.offset();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        self.slot_at(SlotPosition { row, col })
    }

    /// Direction from `from` to `to` if the two slots share an edge.
    pub fn adjacency(self, from: &str, to: &str) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.neighbour(from, *d).is_some_and(|n| n.as_str() == to))
    }

    /// Short label for messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ot2 => "OT-2",
            Self::Flex => "Flex",
        }
    }
}

impl fmt::Display for RobotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grid position of a slot. Row 0 is the back of the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotPosition {
    /// Row, 0 at the back.
    pub row: u8,
    /// Column, 0 at the left.
    pub col: u8,
}

/// Cardinal direction on the deck, as seen from the front of the robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the back.
    North,
    /// Towards the front.
    South,
    /// Towards the right.
    East,
    /// Towards the left.
    West,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [Self::North, Self::South, Self::East, Self::West];

    fn offset(self) -> (i8, i8) {
        match self {
            Self::North => (-1, 0),
            Self::South => (1, 0),
            Self::East => (0, 1),
            Self::West => (0, -1),
        }
    }

    /// Whether this is north or south.
    pub fn is_north_south(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    /// Whether this is east or west.
    pub fn is_east_west(self) -> bool {
        matches!(self, Self::East | Self::West)
    }
}
