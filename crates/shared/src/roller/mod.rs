pub mod episode;

use crate::agent::{AgentEpisode, EpisodeEnded, finish_episode};
use crate::input::{DiscreteAction, RollerAction, get_roller_input_map, heuristic_action};
use crate::render::VisualShape;
use avian3d::prelude::{
    AngularVelocity, Collider, LinearVelocity, Mass, Position, RigidBody, Sensor,
};
use bevy::prelude::*;
use episode::{
    CONTROL_FORCE, OBSERVATION_SIZE, StepOutcome, TargetSeekEpisode, collect_observations,
};
use leafwing_input_manager::prelude::ActionState;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub const PLATFORM_SIZE: f32 = 10.0;
pub const PLATFORM_THICKNESS: f32 = 0.1;
pub const AGENT_RADIUS: f32 = 0.5;
pub const DEFAULT_SEED: u64 = 42;

pub struct RollerPlugin;

impl Plugin for RollerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TargetSeekEpisode>()
            .init_resource::<RollerRng>()
            .add_message::<EpisodeEnded>()
            .add_systems(Startup, setup_roller_arena)
            .add_systems(
                FixedUpdate,
                (
                    read_heuristic_input,
                    apply_roller_actions,
                    score_roller_steps,
                    reset_finished_episodes,
                )
                    .chain()
                    .in_set(RollerSystems),
            );
    }
}

/// Runs every fixed step: input, action force, step scoring, episode reset.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct RollerSystems;

#[derive(Resource)]
pub struct RollerRng(pub StdRng);

impl Default for RollerRng {
    fn default() -> Self {
        Self(StdRng::seed_from_u64(DEFAULT_SEED))
    }
}

#[derive(Component, Clone, Debug)]
pub struct RollerAgent {
    pub target: Entity,
}

#[derive(Component, Clone, Debug, Default)]
pub struct RollerTarget;

/// Action to apply on the next fixed step.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct RollerCommand(pub DiscreteAction);

/// Reward and termination of the most recent step.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct LastStep(pub Option<StepOutcome>);

/// Agents carrying this take their action from the keyboard.
#[derive(Component, Clone, Debug, Default)]
pub struct RollerHeuristic;

pub fn spawn_roller_agent(commands: &mut Commands, target: Entity, position: Vec3) -> Entity {
    let agent = commands
        .spawn((
            Name::new("RollerAgent"),
            RollerAgent { target },
            RollerCommand::default(),
            LastStep::default(),
            AgentEpisode::default(),
            Position::from(position),
            LinearVelocity::default(),
            AngularVelocity::default(),
            RigidBody::Dynamic,
            Collider::sphere(AGENT_RADIUS),
            Mass(1.0),
            VisualShape::Ball {
                radius: AGENT_RADIUS,
                color: Color::srgb(0.9, 0.8, 0.1),
            },
        ))
        .id();
    debug!("Roller agent {:?} spawned at {:?}", agent, position);
    agent
}

pub fn setup_roller_arena(
    mut commands: Commands,
    episode: Res<TargetSeekEpisode>,
    mut rng: ResMut<RollerRng>,
) {
    info!("🟡 Setting up roller arena");

    commands.spawn((
        Name::new("Platform"),
        Position::from(Vec3::new(0.0, -PLATFORM_THICKNESS / 2.0, 0.0)),
        RigidBody::Static,
        Collider::cuboid(PLATFORM_SIZE, PLATFORM_THICKNESS, PLATFORM_SIZE),
        VisualShape::Box {
            size: Vec3::new(PLATFORM_SIZE, PLATFORM_THICKNESS, PLATFORM_SIZE),
            color: Color::srgb(0.5, 0.5, 0.55),
        },
    ));

    let target = commands
        .spawn((
            Name::new("Target"),
            RollerTarget,
            Position::from(episode.random_target_position(&mut rng.0)),
            RigidBody::Static,
            Collider::cuboid(1.0, 1.0, 1.0),
            Sensor,
            VisualShape::Box {
                size: Vec3::ONE,
                color: Color::srgb(0.2, 0.4, 0.9),
            },
        ))
        .id();

    spawn_roller_agent(&mut commands, target, episode.spawn_point);
}

/// Switch an agent to keyboard control.
pub fn enable_heuristic(commands: &mut Commands, agent: Entity) {
    commands.entity(agent).insert((
        RollerHeuristic,
        get_roller_input_map(),
        ActionState::<RollerAction>::default(),
    ));
}

fn read_heuristic_input(
    mut agents: Query<(&ActionState<RollerAction>, &mut RollerCommand), With<RollerHeuristic>>,
) {
    for (action_state, mut command) in agents.iter_mut() {
        command.0 = heuristic_action(action_state);
    }
}

fn apply_roller_actions(
    mut agents: Query<(&RollerCommand, &Mass, &mut LinearVelocity), With<RollerAgent>>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (command, mass, mut velocity) in agents.iter_mut() {
        if mass.0 <= 0.0 {
            continue;
        }
        velocity.0 += command.0.control_signal(CONTROL_FORCE) / mass.0 * dt;
    }
}

fn score_roller_steps(
    mut agents: Query<(
        Entity,
        &RollerAgent,
        &Position,
        &mut AgentEpisode,
        &mut LastStep,
    )>,
    targets: Query<&Position, (With<RollerTarget>, Without<RollerAgent>)>,
    episode: Res<TargetSeekEpisode>,
    mut episode_events: MessageWriter<EpisodeEnded>,
) {
    for (entity, agent, position, mut agent_episode, mut last_step) in agents.iter_mut() {
        let Ok(target) = targets.get(agent.target) else {
            debug!("Roller agent {:?} has no target", entity);
            continue;
        };

        let outcome = episode.on_step(position.0, target.0);
        agent_episode.record_step();
        agent_episode.add_reward(outcome.reward);
        last_step.0 = Some(outcome);

        if outcome.terminal {
            debug!("Roller agent {:?} terminal: {:?}", entity, outcome.termination);
            finish_episode(entity, &mut agent_episode, &mut episode_events);
        }
    }
}

fn reset_finished_episodes(
    mut agents: Query<
        (
            &RollerAgent,
            &LastStep,
            &mut Position,
            &mut LinearVelocity,
            &mut AngularVelocity,
        ),
        Without<RollerTarget>,
    >,
    mut targets: Query<&mut Position, (With<RollerTarget>, Without<RollerAgent>)>,
    episode: Res<TargetSeekEpisode>,
    mut rng: ResMut<RollerRng>,
) {
    for (agent, last_step, mut position, mut velocity, mut angular) in agents.iter_mut() {
        if !last_step.0.is_some_and(|step| step.terminal) {
            continue;
        }

        let start = episode.reset_episode(position.0, &mut rng.0);
        if let Some(respawn) = start.agent {
            position.0 = respawn.position;
            velocity.0 = respawn.linear_velocity;
            angular.0 = respawn.angular_velocity;
        }
        if let Ok(mut target) = targets.get_mut(agent.target) {
            target.0 = start.target_position;
        }
    }
}

/// Observation vector for one agent, or `None` if its target is gone.
pub fn roller_observation(
    agent: &RollerAgent,
    position: &Position,
    velocity: &LinearVelocity,
    targets: &Query<&Position, (With<RollerTarget>, Without<RollerAgent>)>,
) -> Option<[f32; OBSERVATION_SIZE]> {
    let target = targets.get(agent.target).ok()?;
    Some(collect_observations(target.0, position.0, velocity.0))
}
