use serde::{Deserialize, Serialize};

/// Hyperparameters for the Q-learning agents and the headless environments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epsilon: f32,
    pub epsilon_decay: f32,
    pub epsilon_min: f32,
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub batch_size: usize,
    pub buffer_size: usize,
    pub target_update_frequency: usize,
    pub hidden_size: usize,
    /// Number of environment copies stepped together in headless training.
    pub num_envs: usize,
    /// Step limit after which a headless episode is cut short.
    pub max_episode_steps: u32,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            learning_rate: 0.001,
            discount_factor: 0.99,
            batch_size: 32,
            buffer_size: 10000,
            target_update_frequency: 100,
            hidden_size: 64,
            num_envs: 8,
            max_episode_steps: 1000,
            seed: 42,
        }
    }
}
