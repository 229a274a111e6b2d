//! Per-viewer snapshot projection
//!
//! These are the wire types handed to the transport collaborator. A
//! snapshot is always built for one specific viewer: every other player's
//! hand is replaced with an empty sequence before it leaves the engine, so
//! unplayed hands are never observable by anyone but their owner, in any
//! phase. Programs, positions, damage, lives, and the event log are public.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::board::{Board, Direction, Position};
use super::card::Card;
use super::register::PROGRAM_SLOTS;
use super::robot::RobotState;
use super::room::RoomPhase;

/// One player's entry in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub name: String,
    pub lives: u32,
    pub damage: u32,
    pub position: Position,
    pub direction: Direction,
    pub program: Vec<Option<Card>>,
    /// Empty unless the viewer owns this robot
    pub hand: Vec<Card>,
    pub powered_down: bool,
    pub announced_power_down: bool,
    pub flags_collected: Vec<Uuid>,
}

/// Board dimensions as seen by clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoardView {
    pub width: i32,
    pub height: i32,
}

/// A per-viewer projection of the match, safe to broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: RoomPhase,
    /// 0 when idle, 1–5 while that register resolves
    pub register_index: u8,
    pub board: BoardView,
    pub players: HashMap<Uuid, PlayerView>,
    pub event_log: Vec<String>,
}

/// Projects internal room state into redacted per-viewer snapshots.
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    pub fn build_for(
        viewer: Uuid,
        phase: RoomPhase,
        register_index: u8,
        board: Board,
        robots: &HashMap<Uuid, RobotState>,
        event_log: &[String],
    ) -> Snapshot {
        let players = robots
            .iter()
            .map(|(&id, robot)| (id, Self::view_of(robot, id == viewer)))
            .collect();

        Snapshot {
            phase,
            register_index,
            board: BoardView {
                width: board.width,
                height: board.height,
            },
            players,
            event_log: event_log.to_vec(),
        }
    }

    fn view_of(robot: &RobotState, is_viewer: bool) -> PlayerView {
        debug_assert_eq!(robot.program.len(), PROGRAM_SLOTS);
        PlayerView {
            name: robot.display_name.clone(),
            lives: robot.lives,
            damage: robot.damage,
            position: robot.position,
            direction: robot.facing,
            program: robot.program.to_vec(),
            hand: if is_viewer {
                robot.hand.clone()
            } else {
                Vec::new()
            },
            powered_down: robot.powered_down,
            announced_power_down: robot.announced_power_down,
            flags_collected: robot.flags_collected.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::deal_hand;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn room_pair() -> (HashMap<Uuid, RobotState>, Uuid, Uuid) {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut robots = HashMap::new();
        let mut a = RobotState::new(Uuid::new_v4(), "Alice".to_string(), 0, Position::new(0, 0));
        a.hand = deal_hand(&mut rng, 0);
        let mut b = RobotState::new(Uuid::new_v4(), "Bob".to_string(), 1, Position::new(1, 0));
        b.hand = deal_hand(&mut rng, 2);
        b.program[0] = Some(b.hand.remove(0));
        let (a_id, b_id) = (a.id, b.id);
        robots.insert(a.id, a);
        robots.insert(b.id, b);
        (robots, a_id, b_id)
    }

    #[test]
    fn own_hand_visible_other_hands_redacted() {
        let (robots, a_id, b_id) = room_pair();
        for phase in [RoomPhase::Lobby, RoomPhase::Programming, RoomPhase::Executing] {
            let snap =
                SnapshotBuilder::build_for(a_id, phase, 0, Board::new(12, 12), &robots, &[]);
            assert_eq!(snap.players[&a_id].hand.len(), 9);
            assert!(snap.players[&b_id].hand.is_empty());

            let snap =
                SnapshotBuilder::build_for(b_id, phase, 0, Board::new(12, 12), &robots, &[]);
            assert!(snap.players[&a_id].hand.is_empty());
            assert_eq!(snap.players[&b_id].hand.len(), 6);
        }
    }

    #[test]
    fn programs_are_public() {
        let (robots, a_id, b_id) = room_pair();
        let snap = SnapshotBuilder::build_for(
            a_id,
            RoomPhase::Executing,
            3,
            Board::new(12, 12),
            &robots,
            &[],
        );
        assert!(snap.players[&b_id].program[0].is_some());
        assert_eq!(snap.register_index, 3);
    }

    #[test]
    fn snapshot_serializes_with_protocol_names() {
        let (robots, a_id, _) = room_pair();
        let log = vec!["Alice joined the room.".to_string()];
        let snap = SnapshotBuilder::build_for(
            a_id,
            RoomPhase::Programming,
            0,
            Board::new(12, 12),
            &robots,
            &log,
        );
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "PROGRAMMING");
        assert_eq!(json["board"]["width"], 12);
        assert_eq!(json["eventLog"][0], "Alice joined the room.");
        let me = &json["players"][a_id.to_string()];
        assert_eq!(me["name"], "Alice");
        assert_eq!(me["direction"], "NORTH");
        assert_eq!(me["hand"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn redacted_view_roundtrips() {
        let (robots, a_id, _) = room_pair();
        let snap = SnapshotBuilder::build_for(
            a_id,
            RoomPhase::Programming,
            0,
            Board::new(12, 12),
            &robots,
            &[],
        );
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.players.len(), 2);
        assert_eq!(back.players[&a_id].hand.len(), 9);
    }
}
