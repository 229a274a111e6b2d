//! Program cards and random hand dealing

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Inclusive lower bound of the card priority range
pub const PRIORITY_MIN: i32 = 10;
/// Exclusive upper bound of the card priority range
pub const PRIORITY_MAX: i32 = 810;

/// Base hand size before damage reduction
pub const BASE_HAND_SIZE: u32 = 9;

/// The seven movement card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    #[serde(rename = "MOVE_1")]
    Move1,
    #[serde(rename = "MOVE_2")]
    Move2,
    #[serde(rename = "MOVE_3")]
    Move3,
    #[serde(rename = "BACKUP")]
    Backup,
    #[serde(rename = "TURN_LEFT")]
    TurnLeft,
    #[serde(rename = "TURN_RIGHT")]
    TurnRight,
    #[serde(rename = "U_TURN")]
    UTurn,
}

impl CardKind {
    pub const ALL: [CardKind; 7] = [
        CardKind::Move1,
        CardKind::Move2,
        CardKind::Move3,
        CardKind::Backup,
        CardKind::TurnLeft,
        CardKind::TurnRight,
        CardKind::UTurn,
    ];
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CardKind::Move1 => "MOVE_1",
            CardKind::Move2 => "MOVE_2",
            CardKind::Move3 => "MOVE_3",
            CardKind::Backup => "BACKUP",
            CardKind::TurnLeft => "TURN_LEFT",
            CardKind::TurnRight => "TURN_RIGHT",
            CardKind::UTurn => "U_TURN",
        };
        f.write_str(label)
    }
}

/// A dealt card instance. Immutable once dealt; the id is unique per
/// instance, while kind and priority may repeat within a hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub priority: i32,
}

/// Number of cards a robot is dealt at its current damage level.
pub fn hand_size(damage: u32) -> usize {
    BASE_HAND_SIZE.saturating_sub(damage) as usize
}

/// Deal a fresh random hand. Kind and priority are sampled independently;
/// duplicate kinds or priorities within one hand are valid game states.
pub fn deal_hand(rng: &mut ChaCha8Rng, damage: u32) -> Vec<Card> {
    (0..hand_size(damage))
        .map(|_| Card {
            id: Uuid::new_v4(),
            kind: CardKind::ALL[rng.gen_range(0..CardKind::ALL.len())],
            priority: rng.gen_range(PRIORITY_MIN..PRIORITY_MAX),
        })
        .collect()
}
