//! Room state and authoritative command loop
//!
//! One room owns one match. The `GameRoom` aggregate is the single writer
//! of all robot state; commands reach it through the `RoomTask` actor and
//! every rejection travels back to the caller on a oneshot reply. Nothing
//! outside this module mutates robots or the board.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

use super::board::{Board, Position};
use super::card::{deal_hand, Card};
use super::register::{RegisterResolver, PROGRAM_SLOTS};
use super::robot::RobotState;
use super::snapshot::{Snapshot, SnapshotBuilder};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    /// Waiting for players
    Lobby,
    /// Players secretly choosing their 5 cards
    Programming,
    /// Registers resolving; transient, fully resolves within one command
    Executing,
}

/// How `submit_program` treats card references that don't match the
/// server-held hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardPolicy {
    /// Accept unresolvable entries as given. Tolerates client/server
    /// card-object drift at the cost of trusting submitted priorities.
    #[default]
    Permissive,
    /// Reject the whole program with `InvalidCardReference`.
    Strict,
}

/// Typed, recoverable command rejections. None of these leaves the room
/// partially mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room is full")]
    RoomFull,

    #[error("match already started")]
    MatchAlreadyStarted,

    #[error("command not valid in the current phase")]
    InvalidPhase,

    #[error("player is not in this room")]
    UnknownPlayer,

    #[error("program already submitted this turn")]
    AlreadyReady,

    #[error("a program must contain exactly 5 cards")]
    MalformedProgram,

    #[error("submitted card is not in hand")]
    InvalidCardReference,

    #[error("room is no longer running")]
    RoomClosed,
}

/// Room tunables, normally taken from `Config`.
#[derive(Debug, Clone, Copy)]
pub struct RoomSettings {
    pub min_players: usize,
    pub max_players: usize,
    pub board: Board,
    pub card_policy: CardPolicy,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 6,
            board: Board::new(12, 12),
            card_policy: CardPolicy::default(),
        }
    }
}

/// Authoritative state for one room.
pub struct GameRoom {
    id: Uuid,
    board: Board,
    robots: HashMap<Uuid, RobotState>,
    phase: RoomPhase,
    /// 0 when idle, 1–5 while that register resolves
    register_index: u8,
    event_log: Vec<String>,
    min_players: usize,
    max_players: usize,
    card_policy: CardPolicy,
    next_join_seq: u64,
    rng: ChaCha8Rng,
    /// Transport attach points, one snapshot channel per connected player
    connections: HashMap<Uuid, mpsc::Sender<Snapshot>>,
}

impl GameRoom {
    pub fn new(id: Uuid, seed: u64, settings: RoomSettings) -> Self {
        let mut room = Self {
            id,
            board: settings.board,
            robots: HashMap::new(),
            phase: RoomPhase::Lobby,
            register_index: 0,
            event_log: Vec::new(),
            min_players: settings.min_players.max(1),
            max_players: settings.max_players,
            card_policy: settings.card_policy,
            next_join_seq: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            connections: HashMap::new(),
        };
        room.log(format!("Room {id} created."));
        room
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// Add a player, or re-attach an existing one. A known id always
    /// reconnects without touching its robot; a new id is admitted only
    /// in the lobby and while a seat is free.
    pub fn handle_join(
        &mut self,
        player_id: Uuid,
        display_name: Option<String>,
        snapshot_tx: mpsc::Sender<Snapshot>,
    ) -> Result<(), RoomError> {
        if self.robots.contains_key(&player_id) {
            self.connections.insert(player_id, snapshot_tx);
            let name = self.robots[&player_id].display_name.clone();
            self.log(format!("{name} reconnected."));
            self.broadcast();
            return Ok(());
        }

        if self.robots.len() >= self.max_players {
            return Err(RoomError::RoomFull);
        }
        if self.phase != RoomPhase::Lobby {
            return Err(RoomError::MatchAlreadyStarted);
        }

        // Deterministic start coordinate from occupancy count, wrapping
        // to subsequent rows.
        let n = self.robots.len() as i32;
        let start = Position::new(n % self.board.width, (n / self.board.width) % self.board.height);
        let name = display_name
            .unwrap_or_else(|| format!("Player_{}", &player_id.to_string()[..8]));

        let robot = RobotState::new(player_id, name.clone(), self.next_join_seq, start);
        self.next_join_seq += 1;
        self.robots.insert(player_id, robot);
        self.connections.insert(player_id, snapshot_tx);
        self.log(format!("{name} joined the room."));
        info!(
            room_id = %self.id,
            player_id = %player_id,
            player_count = self.robots.len(),
            "Player joined room"
        );

        if self.robots.len() >= self.min_players {
            self.start_game();
        }

        self.broadcast();
        Ok(())
    }

    /// Remove a player and every card they own. No-op for unknown ids.
    pub fn handle_leave(&mut self, player_id: Uuid) -> Result<(), RoomError> {
        let Some(robot) = self.robots.remove(&player_id) else {
            return Ok(());
        };
        self.connections.remove(&player_id);
        self.log(format!("{} left the room.", robot.display_name));
        info!(
            room_id = %self.id,
            player_id = %player_id,
            player_count = self.robots.len(),
            "Player left room"
        );

        if self.robots.is_empty() {
            return Ok(());
        }

        if self.phase != RoomPhase::Lobby && self.robots.len() < self.min_players {
            // The match is not paused for underpopulation.
            warn!(room_id = %self.id, "Player count below minimum, match continues");
            self.log("Player count dropped below minimum. The match continues.".to_string());
        }

        self.check_all_ready();
        self.broadcast();
        Ok(())
    }

    /// Commit a 5-card program. Resolution against the hand is
    /// all-or-nothing; on success the cards move from hand to program
    /// slots in submission order and the player is marked ready.
    pub fn handle_submit_program(
        &mut self,
        player_id: Uuid,
        cards: Vec<Card>,
    ) -> Result<(), RoomError> {
        let (ready, hand, name) = {
            let robot = self.robots.get(&player_id).ok_or(RoomError::UnknownPlayer)?;
            (robot.ready, robot.hand.clone(), robot.display_name.clone())
        };
        if self.phase != RoomPhase::Programming {
            return Err(RoomError::InvalidPhase);
        }
        if ready {
            return Err(RoomError::AlreadyReady);
        }
        if cards.len() != PROGRAM_SLOTS {
            return Err(RoomError::MalformedProgram);
        }

        let mut remaining = hand;
        let mut slots: [Option<Card>; PROGRAM_SLOTS] = Default::default();
        for (i, submitted) in cards.into_iter().enumerate() {
            match remaining.iter().position(|c| c.id == submitted.id) {
                Some(idx) => slots[i] = Some(remaining.remove(idx)),
                None => match self.card_policy {
                    CardPolicy::Strict => return Err(RoomError::InvalidCardReference),
                    // Keep the submitted entry verbatim. Tolerates card
                    // drift between client and server.
                    CardPolicy::Permissive => slots[i] = Some(submitted),
                },
            }
        }

        if let Some(robot) = self.robots.get_mut(&player_id) {
            robot.hand = remaining;
            robot.program = slots;
            robot.ready = true;
        }
        self.log(format!("{name} submitted their program."));

        self.check_all_ready();
        self.broadcast();
        Ok(())
    }

    /// Flip the announced-power-down flag. Takes effect at the next
    /// cycle boundary.
    pub fn handle_toggle_power_down(&mut self, player_id: Uuid) -> Result<(), RoomError> {
        let robot = self
            .robots
            .get_mut(&player_id)
            .ok_or(RoomError::UnknownPlayer)?;
        robot.announced_power_down = !robot.announced_power_down;
        let name = robot.display_name.clone();
        let line = if robot.announced_power_down {
            format!("{name} announced intention to power down next turn.")
        } else {
            format!("{name} withdrew their power down announcement.")
        };
        self.log(line);
        self.broadcast();
        Ok(())
    }

    fn start_game(&mut self) {
        self.phase = RoomPhase::Programming;
        self.log("Minimum player count reached. Programming phase begins.".to_string());
        self.deal_hands();
    }

    /// The all-ready trigger: robots with lives and power are the ones
    /// being waited on. All of them ready, or none of them left while
    /// the room still has players, advances the turn.
    fn check_all_ready(&mut self) {
        if self.phase != RoomPhase::Programming || self.robots.is_empty() {
            return;
        }

        let mut any_active = false;
        let mut all_ready = true;
        for robot in self.robots.values().filter(|r| r.is_active()) {
            any_active = true;
            if !robot.ready {
                all_ready = false;
            }
        }

        if !any_active || all_ready {
            self.log("All players ready. Advancing from PROGRAMMING phase.".to_string());
            self.run_turn();
        }
    }

    /// Resolve registers 1–5, then end-of-turn bookkeeping. Runs to
    /// completion inside the current command; no other command can
    /// interleave.
    fn run_turn(&mut self) {
        self.phase = RoomPhase::Executing;
        self.log("Phase changed to EXECUTING.".to_string());

        for slot in 0..PROGRAM_SLOTS {
            self.register_index = (slot + 1) as u8;
            for robot_id in RegisterResolver::execution_order(&self.robots, slot) {
                let Some(robot) = self.robots.get_mut(&robot_id) else {
                    continue;
                };
                let Some(card) = robot.program[slot].clone() else {
                    continue;
                };
                RegisterResolver::apply_card(robot, card.kind, &self.board);
                let line = format!(
                    "{} executes {} (priority {}).",
                    robot.display_name, card.kind, card.priority
                );
                self.log(line);
            }

            RegisterResolver::resolve_board_elements(&mut self.robots, &self.board);
            RegisterResolver::resolve_lasers(&mut self.robots, &self.board);

            // Observers see intermediate positions after every register.
            self.broadcast();
        }

        self.end_of_turn();
        self.register_index = 0;
        self.phase = RoomPhase::Programming;
        self.log("New turn. Phase changed back to PROGRAMMING.".to_string());
        self.broadcast();
    }

    /// Cycle boundary: ready flags and programs clear, power-down
    /// transitions apply, then hands are re-dealt.
    fn end_of_turn(&mut self) {
        let ids: Vec<Uuid> = self.robots.keys().copied().collect();
        for id in ids {
            let mut line = None;
            if let Some(robot) = self.robots.get_mut(&id) {
                robot.ready = false;
                robot.clear_program();

                if robot.powered_down {
                    if robot.announced_power_down {
                        robot.announced_power_down = false;
                        line = Some(format!("{} remains powered down.", robot.display_name));
                    } else {
                        robot.powered_down = false;
                        line = Some(format!("{} powers back up.", robot.display_name));
                    }
                } else if robot.announced_power_down {
                    robot.powered_down = true;
                    robot.announced_power_down = false;
                    // A robot spends the cycle shut down and fully repairs.
                    robot.damage = 0;
                    line = Some(format!("{} is now powered down.", robot.display_name));
                }
            }
            if let Some(line) = line {
                self.log(line);
            }
        }

        self.deal_hands();
    }

    fn deal_hands(&mut self) {
        let ids: Vec<Uuid> = self.robots.keys().copied().collect();
        for id in ids {
            let mut line = None;
            if let Some(robot) = self.robots.get_mut(&id) {
                if robot.is_active() {
                    let hand = deal_hand(&mut self.rng, robot.damage);
                    line = Some(format!(
                        "Dealt {} cards to {}.",
                        hand.len(),
                        robot.display_name
                    ));
                    robot.hand = hand;
                } else {
                    robot.hand.clear();
                }
            }
            if let Some(line) = line {
                self.log(line);
            }
        }
    }

    /// Hand one redacted snapshot per connected player to the transport.
    /// A full or closed channel is that recipient's problem alone.
    fn broadcast(&mut self) {
        for (&player_id, tx) in &self.connections {
            let snapshot = SnapshotBuilder::build_for(
                player_id,
                self.phase,
                self.register_index,
                self.board,
                &self.robots,
                &self.event_log,
            );
            if let Err(e) = tx.try_send(snapshot) {
                warn!(room_id = %self.id, %player_id, error = %e, "Snapshot delivery failed");
            }
        }
    }

    fn log(&mut self, line: String) {
        info!(room_id = %self.id, "{line}");
        self.event_log.push(line);
    }
}

/// Commands consumed by the room task.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player_id: Uuid,
        display_name: Option<String>,
        snapshot_tx: mpsc::Sender<Snapshot>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: Uuid,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    SubmitProgram {
        player_id: Uuid,
        cards: Vec<Card>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    TogglePowerDown {
        player_id: Uuid,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
}

/// Cloneable handle the transport layer uses to drive a room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub id: Uuid,
    command_tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub async fn join(
        &self,
        player_id: Uuid,
        display_name: Option<String>,
        snapshot_tx: mpsc::Sender<Snapshot>,
    ) -> Result<(), RoomError> {
        self.send(|reply| RoomCommand::Join {
            player_id,
            display_name,
            snapshot_tx,
            reply,
        })
        .await
    }

    pub async fn leave(&self, player_id: Uuid) -> Result<(), RoomError> {
        self.send(|reply| RoomCommand::Leave { player_id, reply }).await
    }

    pub async fn submit_program(
        &self,
        player_id: Uuid,
        cards: Vec<Card>,
    ) -> Result<(), RoomError> {
        self.send(|reply| RoomCommand::SubmitProgram {
            player_id,
            cards,
            reply,
        })
        .await
    }

    pub async fn toggle_power_down(&self, player_id: Uuid) -> Result<(), RoomError> {
        self.send(|reply| RoomCommand::TogglePowerDown { player_id, reply })
            .await
    }

    async fn send<F>(&self, make: F) -> Result<(), RoomError>
    where
        F: FnOnce(oneshot::Sender<Result<(), RoomError>>) -> RoomCommand,
    {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| RoomError::RoomClosed)?;
        rx.await.map_err(|_| RoomError::RoomClosed)?
    }
}

/// The room actor: exclusively owns a `GameRoom` and applies commands one
/// at a time, so no two commands for the same room ever interleave.
pub struct RoomTask {
    room: GameRoom,
    command_rx: mpsc::Receiver<RoomCommand>,
    ever_populated: bool,
}

impl RoomTask {
    pub fn new(id: Uuid, seed: u64, settings: RoomSettings) -> (Self, RoomHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let task = Self {
            room: GameRoom::new(id, seed, settings),
            command_rx,
            ever_populated: false,
        };
        (task, RoomHandle { id, command_tx })
    }

    pub async fn run(mut self) {
        info!(room_id = %self.room.id(), "Room task started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.dispatch(cmd);

            self.ever_populated |= !self.room.is_empty();
            if self.ever_populated && self.room.is_empty() {
                info!(room_id = %self.room.id(), "Room empty, shutting down");
                break;
            }
        }

        info!(room_id = %self.room.id(), "Room task stopped");
    }

    fn dispatch(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player_id,
                display_name,
                snapshot_tx,
                reply,
            } => {
                let _ = reply.send(self.room.handle_join(player_id, display_name, snapshot_tx));
            }
            RoomCommand::Leave { player_id, reply } => {
                let _ = reply.send(self.room.handle_leave(player_id));
            }
            RoomCommand::SubmitProgram {
                player_id,
                cards,
                reply,
            } => {
                let _ = reply.send(self.room.handle_submit_program(player_id, cards));
            }
            RoomCommand::TogglePowerDown { player_id, reply } => {
                let _ = reply.send(self.room.handle_toggle_power_down(player_id));
            }
        }
    }
}
