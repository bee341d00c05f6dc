use std::fmt;

use glam::Vec2;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque player identifier. Decodes from a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PlayerIdVisitor)
    }
}

struct PlayerIdVisitor;

impl Visitor<'_> for PlayerIdVisitor {
    type Value = PlayerId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a player id string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PlayerId, E> {
        Ok(PlayerId::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<PlayerId, E> {
        Ok(PlayerId(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PlayerId, E> {
        Ok(PlayerId(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PlayerId, E> {
        Ok(PlayerId(v.to_string()))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    /// Heading in degrees, clockwise from +x.
    pub angle: f32,
    /// Number of checkpoints passed.
    pub checkpoint: u32,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub finished: bool,
}

impl Player {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Checkpoint {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// One authoritative world state. Each received snapshot replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub players: Vec<Player>,
    /// Ordered track waypoints; the last one is the finish line.
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(
        default,
        deserialize_with = "non_empty_winner",
        skip_serializing_if = "Option::is_none"
    )]
    pub winner: Option<PlayerId>,
    #[serde(default)]
    pub started: bool,
}

impl Snapshot {
    pub fn total_checkpoints(&self) -> u32 {
        self.checkpoints.len() as u32
    }

    /// Fraction of the track `player` has completed, in `[0, 1]`.
    pub fn progress(&self, player: &Player) -> f32 {
        if self.checkpoints.is_empty() {
            return 0.0;
        }
        (player.checkpoint as f32 / self.checkpoints.len() as f32).clamp(0.0, 1.0)
    }

    pub fn mean_player_position(&self) -> Option<Vec2> {
        if self.players.is_empty() {
            return None;
        }
        let sum: Vec2 = self.players.iter().map(Player::position).sum();
        Some(sum / self.players.len() as f32)
    }
}

// The server sends `"winner": ""` for as long as the race is running.
fn non_empty_winner<'de, D>(deserializer: D) -> Result<Option<PlayerId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<PlayerId>::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.0.is_empty()))
}
