//! Configuration module - environment variable parsing

use std::env;

use crate::game::board::Board;
use crate::game::room::{CardPolicy, RoomSettings};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Players needed before the match starts
    pub min_players: usize,
    /// Maximum seats in the room
    pub max_players: usize,

    /// Board width in tiles
    pub board_width: i32,
    /// Board height in tiles
    pub board_height: i32,

    /// How submitted card references are validated against hands
    pub card_policy: CardPolicy,

    /// Fixed RNG seed for the room; random when unset
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            min_players: parse_var("ROOM_MIN_PLAYERS", 2)?,
            max_players: parse_var("ROOM_MAX_PLAYERS", 6)?,

            board_width: parse_var("BOARD_WIDTH", 12)?,
            board_height: parse_var("BOARD_HEIGHT", 12)?,

            card_policy: match env::var("CARD_POLICY").as_deref() {
                Err(_) | Ok("permissive") => CardPolicy::Permissive,
                Ok("strict") => CardPolicy::Strict,
                Ok(_) => return Err(ConfigError::Invalid("CARD_POLICY")),
            },

            seed: match env::var("ROOM_SEED") {
                Err(_) => None,
                Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid("ROOM_SEED"))?),
            },
        };

        if config.min_players == 0 || config.min_players > config.max_players {
            return Err(ConfigError::Invalid("ROOM_MIN_PLAYERS"));
        }
        if config.board_width < 1 || config.board_height < 1 {
            return Err(ConfigError::Invalid("BOARD_WIDTH"));
        }

        Ok(config)
    }

    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            min_players: self.min_players,
            max_players: self.max_players,
            board: Board::new(self.board_width, self.board_height),
            card_policy: self.card_policy,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
