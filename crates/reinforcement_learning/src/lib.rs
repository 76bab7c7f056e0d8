pub mod config;
pub mod env;
pub mod reinforcement_learning;
pub mod trainer;
pub mod vec_env;

#[cfg(test)]
mod tests;

pub use config::TrainingConfig;
pub use env::{Environment, RollerEnv, Transition};
pub use reinforcement_learning::{
    Experience, RLControlled, RLPlugin, RLTrainingState, SimpleNetwork,
};
pub use trainer::{VecEnvTrainer, VecEnvTrainingPlugin};
pub use vec_env::{VecEnv, VecTransition};
