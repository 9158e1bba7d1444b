//! Deck adjacency properties across both robot types.

use proptest::prelude::*;
use tipflow_deck::{Direction, RobotType};

fn opposite(d: Direction) -> Direction {
    match d {
        Direction::North => Direction::South,
        Direction::South => Direction::North,
        Direction::East => Direction::West,
        Direction::West => Direction::East,
    }
}

fn robot() -> impl Strategy<Value = RobotType> {
    prop_oneof![Just(RobotType::Ot2), Just(RobotType::Flex)]
}

proptest! {
    #[test]
    fn neighbour_relation_is_symmetric(robot in robot(), idx in 0usize..16, dir in 0usize..4) {
        let slots = robot.slots();
        let slot = slots[idx % slots.len()];
        let d = Direction::ALL[dir];
        if let Some(n) = robot.neighbour(slot, d) {
            let back = robot.neighbour(n.as_str(), opposite(d));
            prop_assert_eq!(back.as_ref().map(|s| s.as_str()), Some(slot));
            prop_assert_eq!(robot.adjacency(slot, n.as_str()), Some(d));
        }
    }

    #[test]
    fn every_slot_has_between_two_and_four_neighbours(robot in robot(), idx in 0usize..16) {
        let slots = robot.slots();
        let slot = slots[idx % slots.len()];
        let count = Direction::ALL
            .into_iter()
            .filter(|d| robot.neighbour(slot, *d).is_some())
            .count();
        prop_assert!((2..=4).contains(&count));
    }
}

#[test]
fn fixed_trash_slot_is_back_right_on_ot2() {
    let pos = RobotType::Ot2.position("12").unwrap();
    assert_eq!((pos.row, pos.col), (0, 2));
}

#[test]
fn flex_staging_column_is_east_of_column_three() {
    assert_eq!(
        RobotType::Flex.neighbour("C3", Direction::East).map(|s| s.0),
        Some("C4".to_string())
    );
}
