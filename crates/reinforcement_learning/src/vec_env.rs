use crate::env::{Environment, Transition};
use bevy::log::warn;
use rayon::prelude::*;

/// Result of one environment inside a batched step.
#[derive(Clone, Debug, PartialEq)]
pub struct VecTransition {
    /// First observation of the next episode when `done`, otherwise the step's observation.
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    pub truncated: bool,
    /// Last observation of the finished episode.
    pub terminal_observation: Option<Vec<f32>>,
}

/// Independent environments stepped together, resetting each one as soon as it finishes.
pub struct VecEnv<E> {
    envs: Vec<E>,
}

impl<E: Environment + Send> VecEnv<E> {
    pub fn new(envs: Vec<E>) -> Self {
        Self { envs }
    }

    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    pub fn observation_size(&self) -> usize {
        self.envs.first().map_or(0, Environment::observation_size)
    }

    pub fn action_count(&self) -> usize {
        self.envs.first().map_or(0, Environment::action_count)
    }

    pub fn envs(&self) -> &[E] {
        &self.envs
    }

    pub fn envs_mut(&mut self) -> &mut [E] {
        &mut self.envs
    }

    pub fn reset(&mut self) -> Vec<Vec<f32>> {
        self.envs.par_iter_mut().map(|env| env.reset()).collect()
    }

    /// `None` for an index outside the batch.
    pub fn reset_individual(&mut self, index: usize) -> Option<Vec<f32>> {
        self.envs.get_mut(index).map(|env| env.reset())
    }

    /// Missing actions default to index 0; extra actions are ignored.
    pub fn step(&mut self, actions: &[usize]) -> Vec<VecTransition> {
        if actions.len() != self.envs.len() {
            warn!(
                "VecEnv got {} actions for {} environments",
                actions.len(),
                self.envs.len()
            );
        }

        self.envs
            .par_iter_mut()
            .enumerate()
            .map(|(index, env)| {
                let action = actions.get(index).copied().unwrap_or(0);
                let Transition {
                    observation,
                    reward,
                    done,
                    truncated,
                } = env.step(action);

                if done {
                    VecTransition {
                        observation: env.reset(),
                        reward,
                        done,
                        truncated,
                        terminal_observation: Some(observation),
                    }
                } else {
                    VecTransition {
                        observation,
                        reward,
                        done,
                        truncated,
                        terminal_observation: None,
                    }
                }
            })
            .collect()
    }
}
