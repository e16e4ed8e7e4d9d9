//! Immutable per-tick input snapshots.
//!
//! The outer race loop owns the simulation; the engine only requires that
//! every agent reads the previous tick's committed poses. Nothing in this
//! module is mutated by the engine.

use driveline_core::AgentId;
use driveline_track::{TrackGraph, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical envelope of a kart, constant for the race.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KartSpec {
    pub length: f32,
    pub width: f32,
    pub wheel_base: f32,
    /// Maximum steering angle in radians.
    pub max_steer_angle: f32,
    pub max_speed: f32,
    pub max_energy: f32,
    /// Lateral grip coefficient relating turn radius to a safe speed.
    pub turn_grip: f32,
}

impl KartSpec {
    /// Highest speed at which a turn of `radius` can be driven without
    /// sliding out.
    pub fn speed_for_turn_radius(&self, radius: f32) -> f32 {
        if radius <= 0.0 {
            return 0.0;
        }
        (self.turn_grip * radius).sqrt().min(self.max_speed)
    }
}

impl Default for KartSpec {
    fn default() -> Self {
        Self {
            length: 1.5,
            width: 1.0,
            wheel_base: 1.2,
            max_steer_angle: 0.6,
            max_speed: 25.0,
            max_energy: 10.0,
            turn_grip: 12.0,
        }
    }
}

/// Pose of one racer, own or rival.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KartState<A: AgentId> {
    pub id: A,
    pub position: Vec2,
    /// Heading angle in radians.
    pub heading: f32,
    pub velocity: Vec2,
    /// Forward speed scalar.
    pub speed: f32,
    /// Distance along the track from the start line, this lap.
    pub along: f32,
    pub eliminated: bool,
    pub finished: bool,
    /// Hit by an invulnerability effect; never a valid fire target.
    pub invulnerable: bool,
}

/// Pickup kinds the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ItemKind {
    Banana,
    /// Bubblegum dropped on the track.
    Bubblegum,
    NitroSmall,
    NitroBig,
    BonusBox,
}

impl ItemKind {
    /// Energy gained on pickup, zero for non-nitro items.
    pub fn energy(self) -> f32 {
        match self {
            ItemKind::NitroSmall => 1.0,
            ItemKind::NitroBig => 3.0,
            _ => 0.0,
        }
    }

    pub fn is_harmful(self) -> bool {
        matches!(self, ItemKind::Banana | ItemKind::Bubblegum)
    }
}

/// One pickup visible to the engine this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemSnapshot {
    pub id: u64,
    pub kind: ItemKind,
    pub position: Vec2,
    /// Graph node the item sits on.
    pub node: usize,
    /// False while the item is consumed and waiting to respawn.
    pub available: bool,
}

/// Consumable currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Powerup {
    #[default]
    Nothing,
    Bubblegum,
    Cake,
    Bowling,
    Plunger,
    Zipper,
    Swatter,
}

/// Status effect stuck to the kart.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Attachment {
    #[default]
    None,
    Bomb { seconds_left: f32 },
    Anvil,
    Parachute,
}

impl Attachment {
    pub fn is_detrimental(self) -> bool {
        !matches!(self, Attachment::None)
    }
}

/// Own consumable/effect state for this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KartStatus<A: AgentId> {
    pub powerup: Powerup,
    pub powerup_count: u32,
    pub attachment: Attachment,
    /// Nitro energy in tank.
    pub energy: f32,
    /// Remaining seconds of an own bubblegum shield, zero if none.
    pub shield_seconds: f32,
    /// A plunger is stuck on the windscreen.
    pub blocked_view: bool,
    /// A skid bonus would be granted if the current skid were released.
    pub skid_bonus_ready: bool,
    /// Slipstream benefit is charged and usable.
    pub slipstream_ready: bool,
    /// The kart being drafted behind, if any.
    pub slipstream_target: Option<A>,
    pub on_ground: bool,
    /// Distance to the closest projectile heading for us, if any.
    pub incoming_projectile: Option<f32>,
}

impl<A: AgentId> Default for KartStatus<A> {
    fn default() -> Self {
        Self {
            powerup: Powerup::Nothing,
            powerup_count: 0,
            attachment: Attachment::None,
            energy: 0.0,
            shield_seconds: 0.0,
            blocked_view: false,
            skid_bonus_ready: false,
            slipstream_ready: false,
            slipstream_target: None,
            on_ground: true,
            incoming_projectile: None,
        }
    }
}

/// Race-level context for this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RaceState {
    /// Current lap, counting from 0.
    pub lap: u32,
    pub laps_total: u32,
    /// Rank in the field, 1 = leading.
    pub rank: u32,
    pub num_karts: u32,
    /// True once the start signal has been given.
    pub started: bool,
    /// Seconds since the start signal; zero before it.
    pub seconds_since_go: f32,
    /// Track distance to the nearest human player, used by the
    /// rubber-banding curves. Large when there is none.
    pub distance_to_player: f32,
}

impl Default for RaceState {
    fn default() -> Self {
        Self {
            lap: 0,
            laps_total: 3,
            rank: 1,
            num_karts: 1,
            started: true,
            seconds_since_go: 60.0,
            distance_to_player: 1000.0,
        }
    }
}

/// Everything the engine reads in one tick.
#[derive(Debug, Clone, Copy)]
pub struct WorldSnapshot<'a, A: AgentId> {
    pub graph: &'a TrackGraph,
    pub me: KartState<A>,
    pub spec: KartSpec,
    pub status: KartStatus<A>,
    pub race: RaceState,
    pub rivals: &'a [KartState<A>],
    pub items: &'a [ItemSnapshot],
}

impl<'a, A: AgentId> WorldSnapshot<'a, A> {
    /// Unit vector of the kart's heading.
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.me.heading.cos(), self.me.heading.sin())
    }
}
