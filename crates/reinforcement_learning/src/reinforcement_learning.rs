use crate::config::TrainingConfig;
use avian3d::prelude::{LinearVelocity, Position};
use bevy::prelude::*;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::input::DiscreteAction;
use shared::roller::episode::OBSERVATION_SIZE;
use shared::roller::{
    LastStep, RollerAgent, RollerCommand, RollerSystems, RollerTarget, roller_observation,
};
use std::collections::{HashMap, VecDeque};

pub struct RLPlugin;

impl Plugin for RLPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<RLTrainingState>() {
            app.insert_resource(RLTrainingState::from_config(&TrainingConfig::default()));
        }
        app.add_systems(
            FixedUpdate,
            (collect_rl_observations, train_rl_agent, apply_rl_actions)
                .chain()
                .after(RollerSystems),
        );
    }
}

/// Roller agents whose actions come from the Q-network.
#[derive(Component, Clone, Debug, Default)]
pub struct RLControlled;

/// Simple neural network using nalgebra
#[derive(Clone, Debug)]
pub struct SimpleNetwork {
    weights1: DMatrix<f32>,
    bias1: DVector<f32>,
    weights2: DMatrix<f32>,
    bias2: DVector<f32>,
}

impl SimpleNetwork {
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut R,
    ) -> Self {
        // Xavier initialization
        let w1_scale = (2.0 / (input_size + hidden_size) as f32).sqrt();
        let w2_scale = (2.0 / (hidden_size + output_size) as f32).sqrt();

        let weights1 = DMatrix::from_fn(hidden_size, input_size, |_, _| {
            rng.random_range(-w1_scale..w1_scale)
        });
        let bias1 = DVector::zeros(hidden_size);

        let weights2 = DMatrix::from_fn(output_size, hidden_size, |_, _| {
            rng.random_range(-w2_scale..w2_scale)
        });
        let bias2 = DVector::zeros(output_size);

        Self {
            weights1,
            bias1,
            weights2,
            bias2,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights1.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.weights2.nrows()
    }

    /// Forward pass through the network
    pub fn forward(&self, input: &DVector<f32>) -> DVector<f32> {
        let hidden = &self.weights1 * input + &self.bias1;
        let activated = hidden.map(|x| x.max(0.0)); // ReLU

        &self.weights2 * &activated + &self.bias2
    }

    pub fn q_values(&self, state: &[f32]) -> DVector<f32> {
        self.forward(&DVector::from_column_slice(state))
    }

    /// One SGD step on `0.5 * (Q(state, action) - target)^2`.
    ///
    /// The error is clipped to `[-1, 1]`. Returns the unclipped error.
    pub fn td_update(
        &mut self,
        state: &[f32],
        action: usize,
        target: f32,
        learning_rate: f32,
    ) -> f32 {
        if action >= self.output_size() || state.len() != self.input_size() {
            return 0.0;
        }

        let input = DVector::from_column_slice(state);
        let pre_activation = &self.weights1 * &input + &self.bias1;
        let hidden = pre_activation.map(|x| x.max(0.0));
        let q = &self.weights2 * &hidden + &self.bias2;

        let error = q[action] - target;
        let clipped = error.clamp(-1.0, 1.0);

        // Backprop through the hidden layer before weights2 changes.
        let grad_hidden: DVector<f32> = self.weights2.row(action).transpose() * clipped;
        let grad_pre = grad_hidden.zip_map(&pre_activation, |g, p| if p > 0.0 { g } else { 0.0 });

        for (j, h) in hidden.iter().enumerate() {
            self.weights2[(action, j)] -= learning_rate * clipped * h;
        }
        self.bias2[action] -= learning_rate * clipped;

        self.weights1 -= (&grad_pre * input.transpose()) * learning_rate;
        self.bias1 -= grad_pre * learning_rate;

        error
    }
}

/// Experience replay buffer entry
#[derive(Clone, Debug)]
pub struct Experience {
    pub state: Vec<f32>,
    pub action: DiscreteAction,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub done: bool,
}

#[derive(Resource)]
pub struct RLTrainingState {
    pub q_network: Option<SimpleNetwork>,
    pub target_network: Option<SimpleNetwork>,
    pub experience_buffer: VecDeque<Experience>,
    pub training_enabled: bool,
    pub epsilon: f32,
    pub epsilon_decay: f32,
    pub epsilon_min: f32,
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub batch_size: usize,
    pub buffer_size: usize,
    pub target_update_frequency: usize,
    pub hidden_size: usize,
    pub training_step: usize,
    pub episode_count: usize,
    pub last_observations: HashMap<Entity, Vec<f32>>,
    pub last_actions: HashMap<Entity, DiscreteAction>,
    initial_epsilon: f32,
    rng: StdRng,
}

impl RLTrainingState {
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            q_network: None,
            target_network: None,
            experience_buffer: VecDeque::with_capacity(config.buffer_size.min(65536)),
            training_enabled: true,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            epsilon_min: config.epsilon_min,
            learning_rate: config.learning_rate,
            discount_factor: config.discount_factor,
            batch_size: config.batch_size,
            buffer_size: config.buffer_size,
            target_update_frequency: config.target_update_frequency.max(1),
            hidden_size: config.hidden_size,
            training_step: 0,
            episode_count: 0,
            last_observations: HashMap::new(),
            last_actions: HashMap::new(),
            initial_epsilon: config.epsilon,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Build both networks; the target starts as a copy of the online one.
    pub fn initialize(&mut self) {
        let network = SimpleNetwork::new(
            OBSERVATION_SIZE,
            self.hidden_size,
            DiscreteAction::COUNT,
            &mut self.rng,
        );
        self.target_network = Some(network.clone());
        self.q_network = Some(network);

        info!(
            "🧠 RL agent initialized: {} inputs, {} hidden, {} actions",
            OBSERVATION_SIZE,
            self.hidden_size,
            DiscreteAction::COUNT
        );
    }

    pub fn add_experience(&mut self, experience: Experience) {
        self.experience_buffer.push_back(experience);

        while self.experience_buffer.len() > self.buffer_size {
            self.experience_buffer.pop_front();
        }
    }

    /// Epsilon-greedy over the discrete actions.
    pub fn get_action(&mut self, state: &[f32]) -> DiscreteAction {
        if self.rng.random::<f32>() < self.epsilon {
            return DiscreteAction::from_index(self.rng.random_range(0..DiscreteAction::COUNT));
        }
        self.greedy_action(state)
    }

    /// Highest Q-value action, `NoAction` before initialization.
    pub fn greedy_action(&self, state: &[f32]) -> DiscreteAction {
        match &self.q_network {
            Some(network) if state.len() == network.input_size() => {
                DiscreteAction::from_index(network.q_values(state).imax())
            }
            _ => DiscreteAction::NoAction,
        }
    }

    /// Samples a minibatch and applies one TD update per sample.
    ///
    /// Returns the mean squared TD error, or `None` when the buffer holds less than a batch.
    pub fn train_step(&mut self) -> Option<f32> {
        if self.batch_size == 0 || self.experience_buffer.len() < self.batch_size {
            return None;
        }
        let (Some(q_network), Some(target_network)) =
            (self.q_network.as_mut(), self.target_network.as_ref())
        else {
            return None;
        };

        let mut squared_error = 0.0;
        for _ in 0..self.batch_size {
            let index = self.rng.random_range(0..self.experience_buffer.len());
            let experience = &self.experience_buffer[index];

            let bootstrap = if experience.done {
                0.0
            } else {
                self.discount_factor * target_network.q_values(&experience.next_state).max()
            };
            let target = experience.reward + bootstrap;
            let error = q_network.td_update(
                &experience.state,
                experience.action.index(),
                target,
                self.learning_rate,
            );
            squared_error += error * error;
        }

        self.training_step += 1;
        Some(squared_error / self.batch_size as f32)
    }

    /// Update target network (copy from main network)
    pub fn update_target_network(&mut self) {
        if let Some(q_network) = &self.q_network {
            self.target_network = Some(q_network.clone());
        }
    }

    pub fn update_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    pub fn set_training_enabled(&mut self, enabled: bool) {
        self.training_enabled = enabled;
        info!(
            "RL Training {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn reset_training(&mut self) {
        self.experience_buffer.clear();
        self.last_observations.clear();
        self.last_actions.clear();
        self.training_step = 0;
        self.episode_count = 0;
        self.epsilon = self.initial_epsilon;
        self.initialize();
        info!("RL Training state reset");
    }

    /// Train once, then sync the target network and decay epsilon on schedule.
    pub fn learn(&mut self) -> Option<f32> {
        let loss = self.train_step()?;
        if self.training_step % self.target_update_frequency == 0 {
            self.update_target_network();
        }
        self.update_epsilon();
        Some(loss)
    }
}

/// Turns the last step of each controlled agent into an experience.
fn collect_rl_observations(
    agents: Query<
        (Entity, &RollerAgent, &Position, &LinearVelocity, &LastStep),
        With<RLControlled>,
    >,
    targets: Query<&Position, (With<RollerTarget>, Without<RollerAgent>)>,
    mut rl_state: ResMut<RLTrainingState>,
) {
    if rl_state.q_network.is_none() {
        rl_state.initialize();
    }

    for (entity, agent, position, velocity, last_step) in agents.iter() {
        let Some(observation) = roller_observation(agent, position, velocity, &targets) else {
            continue;
        };
        let observation = observation.to_vec();

        let previous = rl_state
            .last_observations
            .get(&entity)
            .cloned()
            .zip(rl_state.last_actions.get(&entity).copied());
        if let (Some((state, action)), Some(outcome)) = (previous, last_step.0) {
            rl_state.add_experience(Experience {
                state,
                action,
                reward: outcome.reward,
                next_state: observation.clone(),
                done: outcome.terminal,
            });

            if outcome.terminal {
                rl_state.episode_count += 1;
                debug!(
                    "Episode {} ended for agent {:?}: {:?}",
                    rl_state.episode_count, entity, outcome.termination
                );
            }
        }

        rl_state.last_observations.insert(entity, observation);
    }
}

fn train_rl_agent(mut rl_state: ResMut<RLTrainingState>) {
    if !rl_state.training_enabled {
        return;
    }

    let Some(loss) = rl_state.learn() else {
        return;
    };

    if rl_state.training_step % 100 == 0 {
        info!(
            "RL Training Step {}: Loss: {:.4}, Epsilon: {:.3}, Buffer: {}, Episodes: {}",
            rl_state.training_step,
            loss,
            rl_state.epsilon,
            rl_state.experience_buffer.len(),
            rl_state.episode_count
        );
    }
}

fn apply_rl_actions(
    mut agents: Query<(Entity, &mut RollerCommand), With<RLControlled>>,
    mut rl_state: ResMut<RLTrainingState>,
) {
    for (entity, mut command) in agents.iter_mut() {
        let Some(state) = rl_state.last_observations.get(&entity).cloned() else {
            continue;
        };
        let action = rl_state.get_action(&state);
        command.0 = action;
        rl_state.last_actions.insert(entity, action);
    }
}
