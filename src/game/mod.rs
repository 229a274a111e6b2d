//! Match engine modules

pub mod board;
pub mod card;
pub mod register;
pub mod robot;
pub mod room;
pub mod snapshot;

pub use board::{Board, Direction, Position};
pub use card::{Card, CardKind};
pub use robot::RobotState;
pub use room::{CardPolicy, GameRoom, RoomError, RoomHandle, RoomPhase, RoomSettings, RoomTask};
pub use snapshot::{Snapshot, SnapshotBuilder};
