use bevy::prelude::*;

use leafwing_input_manager::Actionlike;
use leafwing_input_manager::prelude::{ActionState, InputMap};
use serde::{Deserialize, Serialize};

/// Keyboard actions used when a human drives the roller agent.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect, Serialize, Deserialize, Actionlike, Default,
)]
pub enum RollerAction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

/// Discrete action space shared by the policy and the heuristic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DiscreteAction {
    #[default]
    NoAction = 0,
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
}

impl DiscreteAction {
    pub const COUNT: usize = 5;
    pub const ALL: [DiscreteAction; Self::COUNT] = [
        DiscreteAction::NoAction,
        DiscreteAction::Up,
        DiscreteAction::Down,
        DiscreteAction::Left,
        DiscreteAction::Right,
    ];

    /// Out-of-range indices fall back to doing nothing.
    pub fn from_index(index: usize) -> Self {
        Self::ALL
            .get(index)
            .copied()
            .unwrap_or(DiscreteAction::NoAction)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Horizontal control signal for this action scaled by `force`.
    pub fn control_signal(self, force: f32) -> Vec3 {
        match self {
            DiscreteAction::NoAction => Vec3::ZERO,
            DiscreteAction::Up => Vec3::new(0.0, 0.0, force),
            DiscreteAction::Down => Vec3::new(0.0, 0.0, -force),
            DiscreteAction::Left => Vec3::new(-force, 0.0, 0.0),
            DiscreteAction::Right => Vec3::new(force, 0.0, 0.0),
        }
    }
}

pub fn get_roller_input_map() -> InputMap<RollerAction> {
    InputMap::<RollerAction>::default()
        .with(RollerAction::Up, KeyCode::ArrowUp)
        .with(RollerAction::Down, KeyCode::ArrowDown)
        .with(RollerAction::Left, KeyCode::ArrowLeft)
        .with(RollerAction::Right, KeyCode::ArrowRight)
}

/// Keys are checked Right, Up, Left, Down; a later pressed key wins.
pub fn heuristic_action(action_state: &ActionState<RollerAction>) -> DiscreteAction {
    let mut action = DiscreteAction::NoAction;
    if action_state.pressed(&RollerAction::Right) {
        action = DiscreteAction::Right;
    }
    if action_state.pressed(&RollerAction::Up) {
        action = DiscreteAction::Up;
    }
    if action_state.pressed(&RollerAction::Left) {
        action = DiscreteAction::Left;
    }
    if action_state.pressed(&RollerAction::Down) {
        action = DiscreteAction::Down;
    }
    action
}
