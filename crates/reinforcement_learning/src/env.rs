//! Headless roller simulation used for fast training outside the Bevy scene.

use bevy::prelude::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use shared::FIXED_TIMESTEP_HZ;
use shared::input::DiscreteAction;
use shared::roller::PLATFORM_SIZE;
use shared::roller::episode::{
    CONTROL_FORCE, OBSERVATION_SIZE, TargetSeekEpisode, collect_observations,
};

pub const GRAVITY: f32 = 9.81;
/// Fraction of horizontal speed lost per second while rolling on the platform.
pub const ROLLING_DRAG: f32 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    /// Cut short by the step limit rather than ended by the episode rules.
    pub truncated: bool,
}

pub trait Environment {
    fn observation_size(&self) -> usize;
    fn action_count(&self) -> usize;
    fn reset(&mut self) -> Vec<f32>;
    fn step(&mut self, action: usize) -> Transition;
}

#[derive(Clone, Debug)]
pub struct RollerEnv {
    pub episode: TargetSeekEpisode,
    pub agent_position: Vec3,
    pub agent_velocity: Vec3,
    pub target_position: Vec3,
    pub max_steps: u32,
    pub steps: u32,
    pub mass: f32,
    dt: f32,
    rng: StdRng,
}

impl RollerEnv {
    pub fn new(seed: u64, max_steps: u32) -> Self {
        let episode = TargetSeekEpisode::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let target_position = episode.random_target_position(&mut rng);
        Self {
            agent_position: episode.spawn_point,
            agent_velocity: Vec3::ZERO,
            target_position,
            episode,
            max_steps,
            steps: 0,
            mass: 1.0,
            dt: (1.0 / FIXED_TIMESTEP_HZ) as f32,
            rng,
        }
    }

    pub fn observation(&self) -> [f32; OBSERVATION_SIZE] {
        collect_observations(self.target_position, self.agent_position, self.agent_velocity)
    }

    pub fn on_platform(&self) -> bool {
        let half = PLATFORM_SIZE / 2.0;
        self.agent_position.x.abs() <= half && self.agent_position.z.abs() <= half
    }

    fn integrate(&mut self, action: DiscreteAction) {
        let dt = self.dt;
        self.agent_velocity += action.control_signal(CONTROL_FORCE) / self.mass * dt;

        let resting_height = self.episode.spawn_point.y;
        let supported = self.on_platform() && self.agent_position.y >= resting_height;
        if supported {
            let drag = (1.0 - ROLLING_DRAG * dt).max(0.0);
            self.agent_velocity.x *= drag;
            self.agent_velocity.z *= drag;
            self.agent_velocity.y = 0.0;
        } else {
            self.agent_velocity.y -= GRAVITY * dt;
        }

        self.agent_position += self.agent_velocity * dt;
    }
}

impl Environment for RollerEnv {
    fn observation_size(&self) -> usize {
        OBSERVATION_SIZE
    }

    fn action_count(&self) -> usize {
        DiscreteAction::COUNT
    }

    fn reset(&mut self) -> Vec<f32> {
        let start = self.episode.reset_episode(self.agent_position, &mut self.rng);
        if let Some(respawn) = start.agent {
            self.agent_position = respawn.position;
            self.agent_velocity = respawn.linear_velocity;
        }
        self.target_position = start.target_position;
        self.steps = 0;
        self.observation().to_vec()
    }

    fn step(&mut self, action: usize) -> Transition {
        self.integrate(DiscreteAction::from_index(action));
        self.steps += 1;

        let outcome = self.episode.on_step(self.agent_position, self.target_position);
        let truncated = !outcome.terminal && self.max_steps > 0 && self.steps >= self.max_steps;
        Transition {
            observation: self.observation().to_vec(),
            reward: outcome.reward,
            done: outcome.terminal || truncated,
            truncated,
        }
    }
}
