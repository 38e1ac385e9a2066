use serde::{Deserialize, Serialize};

/// Coarse protocol phase that scopes which packet ids are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameState {
    Handshaking,
    Status,
    Login,
    Play,
}

impl GameState {
    pub const ALL: [GameState; 4] = [
        GameState::Handshaking,
        GameState::Status,
        GameState::Login,
        GameState::Play,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameState::Handshaking => "handshaking",
            GameState::Status => "status",
            GameState::Login => "login",
            GameState::Play => "play",
        }
    }
}

/// Which peer sends the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Client to server.
    Serverbound,
    /// Server to client.
    Clientbound,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Serverbound, Direction::Clientbound];

    /// The direction of packets travelling the other way.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Serverbound => Direction::Clientbound,
            Direction::Clientbound => Direction::Serverbound,
        }
    }
}
