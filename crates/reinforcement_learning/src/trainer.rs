use crate::config::TrainingConfig;
use crate::env::RollerEnv;
use crate::reinforcement_learning::{Experience, RLTrainingState};
use crate::vec_env::VecEnv;
use bevy::prelude::*;
use shared::input::DiscreteAction;
use std::collections::VecDeque;

const REWARD_WINDOW: usize = 100;
const LOG_EVERY: u64 = 500;

/// Headless training: steps a batch of roller environments every fixed update
/// and exits once the step budget is spent.
pub struct VecEnvTrainingPlugin {
    pub config: TrainingConfig,
    pub max_steps: u64,
}

impl Plugin for VecEnvTrainingPlugin {
    fn build(&self, app: &mut App) {
        info!(
            "🏋️ VecEnv training: {} environments, {} steps",
            self.config.num_envs, self.max_steps
        );
        let mut rl_state = RLTrainingState::from_config(&self.config);
        rl_state.initialize();

        app.insert_resource(rl_state)
            .insert_resource(VecEnvTrainer::new(&self.config, self.max_steps))
            .add_systems(FixedUpdate, step_vec_env);
    }
}

#[derive(Resource)]
pub struct VecEnvTrainer {
    pub vec_env: VecEnv<RollerEnv>,
    pub observations: Vec<Vec<f32>>,
    pub episode_rewards: Vec<f32>,
    pub finished_episodes: usize,
    pub recent_rewards: VecDeque<f32>,
    pub steps: u64,
    pub max_steps: u64,
}

impl VecEnvTrainer {
    pub fn new(config: &TrainingConfig, max_steps: u64) -> Self {
        let envs: Vec<RollerEnv> = (0..config.num_envs.max(1))
            .map(|index| {
                RollerEnv::new(
                    config.seed.wrapping_add(index as u64),
                    config.max_episode_steps,
                )
            })
            .collect();
        let mut vec_env = VecEnv::new(envs);
        let observations = vec_env.reset();
        Self {
            episode_rewards: vec![0.0; vec_env.num_envs()],
            vec_env,
            observations,
            finished_episodes: 0,
            recent_rewards: VecDeque::with_capacity(REWARD_WINDOW),
            steps: 0,
            max_steps,
        }
    }

    pub fn mean_recent_reward(&self) -> Option<f32> {
        if self.recent_rewards.is_empty() {
            return None;
        }
        Some(self.recent_rewards.iter().sum::<f32>() / self.recent_rewards.len() as f32)
    }

    pub fn finished(&self) -> bool {
        self.steps >= self.max_steps
    }

    /// Acts in every environment, stores the experiences and trains once.
    pub fn step(&mut self, rl_state: &mut RLTrainingState) {
        let actions: Vec<DiscreteAction> = self
            .observations
            .iter()
            .map(|observation| rl_state.get_action(observation))
            .collect();
        let indices: Vec<usize> = actions.iter().map(|action| action.index()).collect();
        let transitions = self.vec_env.step(&indices);

        for (index, (transition, action)) in transitions.into_iter().zip(actions).enumerate() {
            let next_state = transition
                .terminal_observation
                .unwrap_or_else(|| transition.observation.clone());
            let state = std::mem::replace(&mut self.observations[index], transition.observation);
            rl_state.add_experience(Experience {
                state,
                action,
                reward: transition.reward,
                next_state,
                done: transition.done && !transition.truncated,
            });

            self.episode_rewards[index] += transition.reward;
            if transition.done {
                let total = std::mem::take(&mut self.episode_rewards[index]);
                if self.recent_rewards.len() == REWARD_WINDOW {
                    self.recent_rewards.pop_front();
                }
                self.recent_rewards.push_back(total);
                self.finished_episodes += 1;
                rl_state.episode_count += 1;
            }
        }

        if rl_state.training_enabled {
            rl_state.learn();
        }
        self.steps += 1;
    }
}

fn step_vec_env(
    mut trainer: ResMut<VecEnvTrainer>,
    mut rl_state: ResMut<RLTrainingState>,
    mut exit: MessageWriter<AppExit>,
) {
    if trainer.finished() {
        exit.write(AppExit::Success);
        return;
    }

    trainer.step(&mut rl_state);

    if trainer.steps % LOG_EVERY == 0 {
        info!(
            "Step {}/{}: episodes {}, mean reward {:.3}, epsilon {:.3}",
            trainer.steps,
            trainer.max_steps,
            trainer.finished_episodes,
            trainer.mean_recent_reward().unwrap_or(0.0),
            rl_state.epsilon
        );
    }

    if trainer.finished() {
        info!(
            "✅ Training finished after {} steps and {} episodes",
            trainer.steps, trainer.finished_episodes
        );
        exit.write(AppExit::Success);
    }
}
