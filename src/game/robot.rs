//! Per-player robot state (authoritative)

use uuid::Uuid;

use super::board::{Direction, Position};
use super::card::Card;
use super::register::PROGRAM_SLOTS;

/// Starting life count
pub const STARTING_LIVES: u32 = 3;

/// Authoritative state for one joined player's robot.
#[derive(Debug, Clone)]
pub struct RobotState {
    pub id: Uuid,
    pub display_name: String,
    /// Monotonic per-room join counter; the deterministic tie-break key
    /// for equal card priorities.
    pub join_seq: u64,

    pub lives: u32,
    pub damage: u32,
    pub position: Position,
    pub facing: Direction,

    /// Private until redacted snapshots are built
    pub hand: Vec<Card>,
    /// Committed program, one card per register
    pub program: [Option<Card>; PROGRAM_SLOTS],
    pub ready: bool,

    /// Announced this cycle, takes effect at the next cycle boundary
    pub announced_power_down: bool,
    pub powered_down: bool,

    // Reserved for the respawn and win-condition extensions.
    pub archive_position: Position,
    pub archive_facing: Direction,
    pub flags_collected: Vec<Uuid>,
}

impl RobotState {
    pub fn new(id: Uuid, display_name: String, join_seq: u64, start: Position) -> Self {
        Self {
            id,
            display_name,
            join_seq,
            lives: STARTING_LIVES,
            damage: 0,
            position: start,
            facing: Direction::North,
            hand: Vec::new(),
            program: Default::default(),
            ready: false,
            announced_power_down: false,
            powered_down: false,
            archive_position: start,
            archive_facing: Direction::North,
            flags_collected: Vec::new(),
        }
    }

    /// Eligible to program and act this cycle.
    pub fn is_active(&self) -> bool {
        self.lives > 0 && !self.powered_down
    }

    /// Discard the committed program. Cards are not returned to hand.
    pub fn clear_program(&mut self) {
        self.program = Default::default();
    }
}
