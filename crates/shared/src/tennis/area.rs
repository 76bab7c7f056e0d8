use crate::agent::AgentEpisode;
use crate::render::{VisualShape, color_from_id};
use crate::tennis::rally::{
    AGENT_A, AGENT_B, FLOOR_A, FLOOR_B, NET, Side, TennisMatch, WALL_A, WALL_B,
};
use avian3d::prelude::{
    AngularVelocity, Collider, CollisionEventsEnabled, Friction, LinearDamping, LinearVelocity,
    Position, Restitution, RigidBody,
};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub const COURT_HALF_LENGTH: f32 = 12.0;
pub const COURT_HALF_WIDTH: f32 = 6.0;
pub const FLOOR_THICKNESS: f32 = 1.0;
pub const WALL_THICKNESS: f32 = 1.0;
pub const WALL_HEIGHT: f32 = 8.0;
pub const NET_HEIGHT: f32 = 1.0;
pub const NET_THICKNESS: f32 = 0.2;
pub const BALL_RADIUS: f32 = 0.25;
pub const SERVE_HEIGHT: f32 = 4.0;
pub const AGENT_START_X: f32 = 8.0;
pub const AGENT_HEIGHT: f32 = 2.0;
pub const AGENT_SPEED: f32 = 10.0;
pub const AGENT_DEPTH: f32 = 0.3;
const TRACKING_GAIN: f32 = 10.0;
/// Agent centre sits this far behind the ball so its net-side edge meets the falling ball.
const TRACKING_OFFSET: f32 = AGENT_DEPTH / 2.0 + 0.1;
/// Ball height, above the agent's top face, at which the agent steps in under it.
const LUNGE_HEIGHT: f32 = 2.0 * BALL_RADIUS;
const LUNGE_RANGE: f32 = 1.0;

/// Marks walls, floors and the net. Contacts with these carry the boundary tag.
#[derive(Component, Clone, Debug, Default)]
pub struct BoundaryTag;

#[derive(Component, Clone, Debug, Default)]
pub struct TennisBall;

#[derive(Component, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TennisAgent {
    pub side: Side,
}

/// Agents carrying this follow the ball on their own half instead of waiting for a policy.
#[derive(Component, Clone, Debug, Default)]
pub struct TennisHeuristic;

/// Which way side A's half extends along x.
fn side_sign(side: Side) -> f32 {
    match side {
        Side::A => -1.0,
        Side::B => 1.0,
    }
}

pub fn agent_name(side: Side) -> &'static str {
    match side {
        Side::A => AGENT_A,
        Side::B => AGENT_B,
    }
}

pub fn agent_start_position(side: Side) -> Vec3 {
    Vec3::new(side_sign(side) * AGENT_START_X, AGENT_HEIGHT / 2.0, 0.0)
}

/// Ball drop point above the middle of the server's half.
pub fn serve_position(server: Side) -> Vec3 {
    Vec3::new(side_sign(server) * COURT_HALF_LENGTH / 2.0, SERVE_HEIGHT, 0.0)
}

pub fn setup_tennis_area(mut commands: Commands) {
    info!("🎾 Setting up tennis area");

    for side in [Side::A, Side::B] {
        let sign = side_sign(side);
        let (floor_name, wall_name) = match side {
            Side::A => (FLOOR_A, WALL_A),
            Side::B => (FLOOR_B, WALL_B),
        };

        commands.spawn((
            Name::new(floor_name),
            BoundaryTag,
            Position::from(Vec3::new(
                sign * COURT_HALF_LENGTH / 2.0,
                -FLOOR_THICKNESS / 2.0,
                0.0,
            )),
            RigidBody::Static,
            Collider::cuboid(COURT_HALF_LENGTH, FLOOR_THICKNESS, COURT_HALF_WIDTH * 2.0),
            Restitution::new(0.8),
            VisualShape::Box {
                size: Vec3::new(COURT_HALF_LENGTH, FLOOR_THICKNESS, COURT_HALF_WIDTH * 2.0),
                color: Color::srgb(0.2, 0.5, 0.3),
            },
        ));

        // Back wall plus the two side walls enclosing this half.
        let walls = [
            (
                Vec3::new(
                    sign * (COURT_HALF_LENGTH + WALL_THICKNESS / 2.0),
                    WALL_HEIGHT / 2.0,
                    0.0,
                ),
                Vec3::new(WALL_THICKNESS, WALL_HEIGHT, COURT_HALF_WIDTH * 2.0),
            ),
            (
                Vec3::new(
                    sign * COURT_HALF_LENGTH / 2.0,
                    WALL_HEIGHT / 2.0,
                    COURT_HALF_WIDTH + WALL_THICKNESS / 2.0,
                ),
                Vec3::new(COURT_HALF_LENGTH, WALL_HEIGHT, WALL_THICKNESS),
            ),
            (
                Vec3::new(
                    sign * COURT_HALF_LENGTH / 2.0,
                    WALL_HEIGHT / 2.0,
                    -COURT_HALF_WIDTH - WALL_THICKNESS / 2.0,
                ),
                Vec3::new(COURT_HALF_LENGTH, WALL_HEIGHT, WALL_THICKNESS),
            ),
        ];

        for (position, size) in walls {
            commands.spawn((
                Name::new(wall_name),
                BoundaryTag,
                Position::from(position),
                RigidBody::Static,
                Collider::cuboid(size.x, size.y, size.z),
                VisualShape::Box {
                    size,
                    color: Color::srgba(0.6, 0.6, 0.6, 0.3),
                },
            ));
        }

        commands.spawn((
            Name::new(agent_name(side)),
            TennisAgent { side },
            AgentEpisode::default(),
            Position::from(agent_start_position(side)),
            LinearVelocity::default(),
            RigidBody::Kinematic,
            Collider::cuboid(AGENT_DEPTH, AGENT_HEIGHT, 1.5),
            VisualShape::Box {
                size: Vec3::new(AGENT_DEPTH, AGENT_HEIGHT, 1.5),
                color: color_from_id(side as u64 + 1),
            },
        ));
    }

    commands.spawn((
        Name::new(NET),
        BoundaryTag,
        Position::from(Vec3::new(0.0, NET_HEIGHT / 2.0, 0.0)),
        RigidBody::Static,
        Collider::cuboid(NET_THICKNESS, NET_HEIGHT, COURT_HALF_WIDTH * 2.0),
        VisualShape::Box {
            size: Vec3::new(NET_THICKNESS, NET_HEIGHT, COURT_HALF_WIDTH * 2.0),
            color: Color::WHITE,
        },
    ));

    commands.spawn((
        Name::new("Ball"),
        TennisBall,
        Position::from(serve_position(Side::A)),
        LinearVelocity::default(),
        AngularVelocity::default(),
        RigidBody::Dynamic,
        Collider::sphere(BALL_RADIUS),
        Restitution::new(0.8),
        Friction::new(0.2),
        LinearDamping(0.05),
        CollisionEventsEnabled,
        VisualShape::Ball {
            radius: BALL_RADIUS,
            color: Color::srgb(0.9, 0.9, 0.2),
        },
    ));
}

/// Re-serve: ball above the next server's half, agents back at their marks, everything at rest.
pub fn reset_tennis_area(
    tennis_match: &TennisMatch,
    balls: &mut Query<
        (&mut Position, &mut LinearVelocity, &mut AngularVelocity),
        (With<TennisBall>, Without<TennisAgent>),
    >,
    agents: &mut Query<(&TennisAgent, &mut Position, &mut LinearVelocity), Without<TennisBall>>,
) {
    let server = tennis_match.server();
    for (mut position, mut velocity, mut angular) in balls.iter_mut() {
        position.0 = serve_position(server);
        velocity.0 = Vec3::ZERO;
        angular.0 = Vec3::ZERO;
    }
    for (agent, mut position, mut velocity) in agents.iter_mut() {
        position.0 = agent_start_position(agent.side);
        velocity.0 = Vec3::ZERO;
    }
    debug!("Tennis area reset, {:?} serves", server);
}

/// Desired velocity for an agent chasing the ball within its own half.
///
/// The agent waits with its net-side edge under the ball, then steps in under it once the
/// ball drops close to its top face so the contact pushes the ball towards the net.
pub fn tracking_velocity(side: Side, agent_position: Vec3, ball_position: Vec3) -> Vec3 {
    let sign = side_sign(side);
    let (near, far) = (sign * NET_THICKNESS * 4.0, sign * COURT_HALF_LENGTH);
    let within_reach = (ball_position.x - agent_position.x).abs() < LUNGE_RANGE
        && ball_position.y < AGENT_HEIGHT + LUNGE_HEIGHT;
    let target_x = if within_reach {
        ball_position.x
    } else {
        ball_position.x + sign * TRACKING_OFFSET
    };
    let target = Vec3::new(
        target_x.clamp(near.min(far), near.max(far)),
        AGENT_HEIGHT / 2.0,
        ball_position.z.clamp(-COURT_HALF_WIDTH, COURT_HALF_WIDTH),
    );
    ((target - agent_position) * TRACKING_GAIN).clamp_length_max(AGENT_SPEED)
}

pub fn track_ball_heuristic(
    balls: Query<&Position, With<TennisBall>>,
    mut agents: Query<
        (&TennisAgent, &Position, &mut LinearVelocity),
        (With<TennisHeuristic>, Without<TennisBall>),
    >,
) {
    let Some(ball) = balls.iter().next() else {
        return;
    };
    for (agent, position, mut velocity) in agents.iter_mut() {
        velocity.0 = tracking_velocity(agent.side, position.0, ball.0);
    }
}
