use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-agent episode accumulator: rewards add up until the episode ends.
#[derive(Component, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentEpisode {
    pub cumulative_reward: f32,
    pub step_count: u32,
    pub completed_episodes: u32,
    pub last_episode_reward: Option<f32>,
}

impl AgentEpisode {
    pub fn add_reward(&mut self, delta: f32) {
        self.cumulative_reward += delta;
    }

    pub fn record_step(&mut self) {
        self.step_count += 1;
    }

    /// Finalize the running episode and start a new one. Returns the finished total.
    pub fn end_episode(&mut self) -> f32 {
        let total = self.cumulative_reward;
        self.last_episode_reward = Some(total);
        self.completed_episodes += 1;
        self.cumulative_reward = 0.0;
        self.step_count = 0;
        total
    }
}

/// Sent whenever an agent's episode finishes.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct EpisodeEnded {
    pub agent: Entity,
    pub total_reward: f32,
    pub steps: u32,
}

/// End the agent's episode and announce it.
pub fn finish_episode(
    agent: Entity,
    episode: &mut AgentEpisode,
    episode_events: &mut MessageWriter<EpisodeEnded>,
) {
    let steps = episode.step_count;
    let total_reward = episode.end_episode();
    debug!(
        "Episode {} ended for {:?} after {} steps with reward {:.3}",
        episode.completed_episodes, agent, steps, total_reward
    );
    episode_events.write(EpisodeEnded {
        agent,
        total_reward,
        steps,
    });
}
