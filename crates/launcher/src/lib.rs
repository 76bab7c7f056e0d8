use anyhow::Context;
use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy::window::PresentMode;
use clap::ValueEnum;
use leafwing_input_manager::prelude::InputManagerPlugin;
use reinforcement_learning::{
    RLControlled, RLPlugin, RLTrainingState, TrainingConfig, VecEnvTrainingPlugin,
};
use serde::{Deserialize, Serialize};
use shared::agent::EpisodeEnded;
use shared::input::RollerAction;
use shared::roller::{RollerAgent, RollerPlugin, enable_heuristic};
use shared::tennis::TennisPlugin;
use shared::tennis::area::{TennisAgent, TennisHeuristic};
use shared::tennis::rally::{RewardTable, TennisMatch};
use shared::{FIXED_TIMESTEP_HZ, SharedPlugin};
use std::path::Path;
use std::time::Duration;

pub mod native;
pub mod render;

#[cfg(test)]
mod tests;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Mode {
    /// Two agents rallying on the tennis court.
    Tennis,
    /// One agent rolling towards a target.
    Roller,
    /// Headless training on batched roller environments.
    Train,
}

/// Settings file passed with `--config`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub training: TrainingConfig,
    pub rewards: RewardTable,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LauncherConfig> {
    let Some(path) = path else {
        return Ok(LauncherConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Headless(pub bool);

/// Agents are driven by the built-in heuristic instead of the policy.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Heuristic(pub bool);

/// Fixed steps left before a headless run exits.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepBudget(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct AppOptions {
    pub mode: Mode,
    pub headless: bool,
    pub heuristic: bool,
    /// Fixed steps to run; 0 means no limit outside of training.
    pub steps: u64,
    /// Install the global logger for headless runs. Tests leave it off.
    pub log: bool,
    pub config: LauncherConfig,
}

pub fn create_app(options: &AppOptions) -> App {
    let mut app = App::new();
    // Training never opens a window.
    let headless = options.headless || options.mode == Mode::Train;

    if headless {
        if options.log {
            app.add_plugins(LogPlugin::default());
        }
        app.add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
            bevy::diagnostic::DiagnosticsPlugin,
            bevy::asset::AssetPlugin::default(),
            bevy::scene::ScenePlugin,
            bevy::mesh::MeshPlugin,
        ));
        // One fixed step per frame, as fast as the machine allows.
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / FIXED_TIMESTEP_HZ,
        )));
    } else {
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: format!("Arena - {:?}", options.mode),
                resolution: (1280, 720).into(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(render::RenderPlugin);
    }

    app.insert_resource(Time::<Fixed>::from_hz(FIXED_TIMESTEP_HZ));
    app.insert_resource(Headless(headless));
    app.insert_resource(Heuristic(options.heuristic));

    match options.mode {
        Mode::Tennis => {
            app.insert_resource(TennisMatch::new(options.config.rewards.clone()));
            app.add_plugins((SharedPlugin, TennisPlugin));
            app.add_systems(PostStartup, assign_tennis_control);
        }
        Mode::Roller => {
            let mut rl_state = RLTrainingState::from_config(&options.config.training);
            rl_state.initialize();
            app.insert_resource(rl_state);
            app.add_plugins((SharedPlugin, RollerPlugin, RLPlugin));
            if !headless {
                app.add_plugins(InputManagerPlugin::<RollerAction>::default());
            }
            app.add_systems(PostStartup, assign_roller_control);
        }
        Mode::Train => {
            app.add_plugins(VecEnvTrainingPlugin {
                config: options.config.training.clone(),
                max_steps: options.steps,
            });
        }
    }

    if options.mode != Mode::Train {
        app.add_systems(Update, log_episode_ends);
    }

    if headless && options.mode != Mode::Train && options.steps > 0 {
        app.insert_resource(StepBudget(options.steps));
        app.add_systems(FixedLast, spend_step_budget);
    }

    info!("🚀 {:?} app created (headless: {})", options.mode, headless);
    app
}

fn assign_tennis_control(
    mut commands: Commands,
    agents: Query<(Entity, &TennisAgent)>,
    heuristic: Res<Heuristic>,
) {
    if !heuristic.0 {
        return;
    }
    for (entity, agent) in agents.iter() {
        commands.entity(entity).insert(TennisHeuristic);
        debug!("Tennis agent {:?} follows the ball", agent.side);
    }
}

fn assign_roller_control(
    mut commands: Commands,
    agents: Query<Entity, With<RollerAgent>>,
    heuristic: Res<Heuristic>,
    headless: Res<Headless>,
) {
    for entity in agents.iter() {
        if heuristic.0 && !headless.0 {
            enable_heuristic(&mut commands, entity);
        } else {
            if heuristic.0 {
                warn!("No keyboard without a window, roller agent uses the policy");
            }
            commands.entity(entity).insert(RLControlled);
        }
    }
}

fn log_episode_ends(mut episodes: MessageReader<EpisodeEnded>) {
    for episode in episodes.read() {
        info!(
            "🏁 Agent {:?} finished an episode: reward {:.2} over {} steps",
            episode.agent, episode.total_reward, episode.steps
        );
    }
}

fn spend_step_budget(mut budget: ResMut<StepBudget>, mut exit: MessageWriter<AppExit>) {
    if budget.0 > 0 {
        budget.0 -= 1;
        if budget.0 > 0 {
            return;
        }
        info!("✅ Step budget spent, exiting");
    }
    exit.write(AppExit::Success);
}
