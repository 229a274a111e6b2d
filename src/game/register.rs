//! Per-register resolution of simultaneously programmed actions

use std::collections::HashMap;
use uuid::Uuid;

use super::board::Board;
use super::card::CardKind;
use super::robot::RobotState;

/// Registers per turn
pub const PROGRAM_SLOTS: usize = 5;

/// Resolves one register's worth of programmed cards.
///
/// Simultaneity is simulated, never real: the register is resolved in a
/// single logical thread of control, one robot at a time, in an order that
/// is a pure function of the card priorities and each robot's join
/// sequence. Running the same inputs twice yields the same order and the
/// same resulting positions.
pub struct RegisterResolver;

impl RegisterResolver {
    /// Execution order for register `slot` (0-based): robots that are
    /// alive, not powered down, and have a card in the slot, sorted by
    /// card priority descending. Priorities are drawn from a shared
    /// random range, so collisions are expected; ties break by join
    /// sequence ascending.
    pub fn execution_order(robots: &HashMap<Uuid, RobotState>, slot: usize) -> Vec<Uuid> {
        let mut acting: Vec<(i32, u64, Uuid)> = robots
            .values()
            .filter(|r| r.is_active())
            .filter_map(|r| r.program[slot].as_ref().map(|c| (c.priority, r.join_seq, r.id)))
            .collect();
        acting.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        acting.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Apply one card's movement primitive to the acting robot. Each
    /// movement step clamps independently, so a MOVE_3 into a wall keeps
    /// attempting the remaining steps from wherever the robot stopped.
    pub fn apply_card(robot: &mut RobotState, kind: CardKind, board: &Board) {
        match kind {
            CardKind::Move1 => Self::advance(robot, board, 1),
            CardKind::Move2 => Self::advance(robot, board, 2),
            CardKind::Move3 => Self::advance(robot, board, 3),
            CardKind::Backup => {
                robot.position = board.step(robot.position, robot.facing.reverse());
            }
            CardKind::TurnLeft => robot.facing = robot.facing.left(),
            CardKind::TurnRight => robot.facing = robot.facing.right(),
            CardKind::UTurn => robot.facing = robot.facing.reverse(),
        }
    }

    fn advance(robot: &mut RobotState, board: &Board, steps: u32) {
        for _ in 0..steps {
            robot.position = board.step(robot.position, robot.facing);
        }
    }

    /// Board-element pass (conveyors, gears, pushers). Extension point:
    /// runs after all cards of a register, currently moves nothing.
    pub fn resolve_board_elements(_robots: &mut HashMap<Uuid, RobotState>, _board: &Board) {}

    /// Laser pass. Extension point, currently fires nothing.
    pub fn resolve_lasers(_robots: &mut HashMap<Uuid, RobotState>, _board: &Board) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Direction, Position};
    use crate::game::card::Card;

    fn robot(join_seq: u64, pos: Position) -> RobotState {
        RobotState::new(Uuid::new_v4(), format!("Bot{join_seq}"), join_seq, pos)
    }

    fn card(kind: CardKind, priority: i32) -> Card {
        Card {
            id: Uuid::new_v4(),
            kind,
            priority,
        }
    }

    #[test]
    fn higher_priority_acts_first() {
        let mut robots = HashMap::new();
        let mut slow = robot(0, Position::new(0, 0));
        slow.program[0] = Some(card(CardKind::Move1, 100));
        let mut fast = robot(1, Position::new(1, 0));
        fast.program[0] = Some(card(CardKind::Move1, 700));
        let (slow_id, fast_id) = (slow.id, fast.id);
        robots.insert(slow.id, slow);
        robots.insert(fast.id, fast);

        assert_eq!(
            RegisterResolver::execution_order(&robots, 0),
            vec![fast_id, slow_id]
        );
    }

    #[test]
    fn priority_ties_break_by_join_order() {
        let mut robots = HashMap::new();
        let mut ids = Vec::new();
        for seq in 0..4 {
            let mut r = robot(seq, Position::new(0, 0));
            r.program[0] = Some(card(CardKind::TurnLeft, 500));
            ids.push(r.id);
            robots.insert(r.id, r);
        }
        let order = RegisterResolver::execution_order(&robots, 0);
        assert_eq!(order, ids);
        // Same inputs, same order
        assert_eq!(RegisterResolver::execution_order(&robots, 0), order);
    }

    #[test]
    fn powered_down_and_dead_robots_do_not_act() {
        let mut robots = HashMap::new();
        let mut down = robot(0, Position::new(0, 0));
        down.powered_down = true;
        down.program[0] = Some(card(CardKind::Move1, 800));
        let mut dead = robot(1, Position::new(0, 0));
        dead.lives = 0;
        dead.program[0] = Some(card(CardKind::Move1, 799));
        let mut live = robot(2, Position::new(0, 0));
        live.program[0] = Some(card(CardKind::Move1, 10));
        let live_id = live.id;
        robots.insert(down.id, down);
        robots.insert(dead.id, dead);
        robots.insert(live.id, live);

        assert_eq!(RegisterResolver::execution_order(&robots, 0), vec![live_id]);
    }

    #[test]
    fn empty_slot_means_no_action() {
        let mut robots = HashMap::new();
        let r = robot(0, Position::new(0, 0));
        robots.insert(r.id, r);
        assert!(RegisterResolver::execution_order(&robots, 2).is_empty());
    }

    #[test]
    fn move_three_from_corner_facing_north_stays_put() {
        let board = Board::new(12, 12);
        let mut r = robot(0, Position::new(0, 0));
        RegisterResolver::apply_card(&mut r, CardKind::Move3, &board);
        assert_eq!(r.position, Position::new(0, 0));
    }

    #[test]
    fn move_three_clamps_per_step_not_per_card() {
        // Two free rows below, then the edge: the robot gains 2 of 3 steps.
        let board = Board::new(3, 3);
        let mut r = robot(0, Position::new(0, 0));
        r.facing = Direction::South;
        RegisterResolver::apply_card(&mut r, CardKind::Move3, &board);
        assert_eq!(r.position, Position::new(0, 2));
    }

    #[test]
    fn backup_steps_opposite_facing() {
        let board = Board::new(5, 5);
        let mut r = robot(0, Position::new(2, 2));
        r.facing = Direction::North;
        RegisterResolver::apply_card(&mut r, CardKind::Backup, &board);
        assert_eq!(r.position, Position::new(2, 3));
        assert_eq!(r.facing, Direction::North);
    }

    #[test]
    fn turns_rotate_without_moving() {
        let board = Board::new(5, 5);
        let mut r = robot(0, Position::new(2, 2));
        RegisterResolver::apply_card(&mut r, CardKind::TurnLeft, &board);
        assert_eq!(r.facing, Direction::West);
        RegisterResolver::apply_card(&mut r, CardKind::UTurn, &board);
        assert_eq!(r.facing, Direction::East);
        RegisterResolver::apply_card(&mut r, CardKind::TurnRight, &board);
        assert_eq!(r.facing, Direction::South);
        assert_eq!(r.position, Position::new(2, 2));
    }
}
