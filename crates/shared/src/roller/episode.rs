//! Step reward and episode reset rules for the single-agent target-seek arena.

use bevy::prelude::{Resource, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Target position (3), agent position (3), agent velocity x and z.
pub const OBSERVATION_SIZE: usize = 8;
pub const CONTROL_FORCE: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    ReachedTarget,
    FellOff,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub reward: f32,
    pub terminal: bool,
    pub termination: Option<Termination>,
}

/// Agent state to apply when it has to be put back on the platform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentRespawn {
    pub position: Vec3,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStart {
    /// `None` when the agent is still on the platform and keeps its state.
    pub agent: Option<AgentRespawn>,
    pub target_position: Vec3,
}

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetSeekEpisode {
    pub step_penalty: f32,
    pub target_reward: f32,
    pub fall_penalty: f32,
    pub reach_distance: f32,
    pub spawn_point: Vec3,
    pub target_height: f32,
    /// Side of the square, centered at the origin, that targets are drawn from.
    pub target_area: f32,
}

impl Default for TargetSeekEpisode {
    fn default() -> Self {
        Self {
            step_penalty: -0.01,
            target_reward: 1.0,
            fall_penalty: -2.0,
            reach_distance: 1.2,
            spawn_point: Vec3::new(0.0, 0.5, 0.0),
            target_height: 0.5,
            target_area: 8.0,
        }
    }
}

impl TargetSeekEpisode {
    pub fn on_step(&self, agent_position: Vec3, target_position: Vec3) -> StepOutcome {
        let mut reward = self.step_penalty;
        let termination = if agent_position.distance(target_position) < self.reach_distance {
            reward += self.target_reward;
            Some(Termination::ReachedTarget)
        } else if agent_position.y < 0.0 {
            reward += self.fall_penalty;
            Some(Termination::FellOff)
        } else {
            None
        };

        StepOutcome {
            reward,
            terminal: termination.is_some(),
            termination,
        }
    }

    pub fn reset_episode<R: Rng + ?Sized>(
        &self,
        agent_position: Vec3,
        rng: &mut R,
    ) -> EpisodeStart {
        let agent = (agent_position.y < 0.0).then_some(AgentRespawn {
            position: self.spawn_point,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        });

        EpisodeStart {
            agent,
            target_position: self.random_target_position(rng),
        }
    }

    pub fn random_target_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let half = self.target_area / 2.0;
        Vec3::new(
            rng.random::<f32>() * self.target_area - half,
            self.target_height,
            rng.random::<f32>() * self.target_area - half,
        )
    }
}

pub fn collect_observations(
    target_position: Vec3,
    agent_position: Vec3,
    agent_velocity: Vec3,
) -> [f32; OBSERVATION_SIZE] {
    [
        target_position.x,
        target_position.y,
        target_position.z,
        agent_position.x,
        agent_position.y,
        agent_position.z,
        agent_velocity.x,
        agent_velocity.z,
    ]
}
