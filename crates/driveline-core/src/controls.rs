#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Requested skid state for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SkidCommand {
    #[default]
    None,
    Left,
    Right,
}

/// One tick's worth of driving output.
///
/// Consumed immediately by the vehicle-physics collaborator; nothing here is
/// retained by the engine between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Controls {
    /// Steering fraction in `[-1, 1]`, positive = left.
    pub steer: f32,
    /// Acceleration in `[0, 1]`.
    pub accel: f32,
    pub brake: bool,
    pub skid: SkidCommand,
    /// Fire the held consumable this tick.
    pub fire: bool,
    /// Fire/look backwards.
    pub look_back: bool,
    pub nitro: bool,
    /// Request a rescue/reposition from the outer race loop.
    pub rescue: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            steer: 0.0,
            accel: 0.0,
            brake: false,
            skid: SkidCommand::None,
            fire: false,
            look_back: false,
            nitro: false,
            rescue: false,
        }
    }
}

impl Controls {
    /// Conservative output for ambiguous inputs: brake, wheels straight.
    pub fn braking() -> Self {
        Self {
            brake: true,
            ..Self::default()
        }
    }
}
