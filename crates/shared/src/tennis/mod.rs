pub mod area;
pub mod rally;

use crate::agent::{AgentEpisode, EpisodeEnded, finish_episode};
use area::{
    BoundaryTag, TennisAgent, TennisBall, reset_tennis_area, setup_tennis_area,
    track_ball_heuristic,
};
use avian3d::prelude::{AngularVelocity, CollisionStart, LinearVelocity, Position};
use bevy::prelude::*;
use rally::{CollisionEvent, RallyEvent, Score, Side, TennisMatch};

/// Tag reported for bodies that are not game boundaries.
pub const UNTAGGED: &str = "Untagged";

pub struct TennisPlugin;

impl Plugin for TennisPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TennisMatch>()
            .add_message::<BallContact>()
            .add_message::<PointScored>()
            .add_message::<EpisodeEnded>()
            .add_systems(Startup, setup_tennis_area)
            .add_systems(
                Update,
                (
                    forward_ball_collisions,
                    process_ball_contacts,
                    reset_match_on_point,
                )
                    .chain(),
            )
            .add_systems(FixedUpdate, (count_tennis_steps, track_ball_heuristic));
    }
}

/// A body the ball just started touching.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct BallContact(pub CollisionEvent);

#[derive(Message, Clone, Debug, PartialEq)]
pub struct PointScored {
    pub winner: Side,
    pub event: RallyEvent,
    pub score: Score,
}

/// Turn physics collisions involving the ball into named contacts.
pub fn forward_ball_collisions(
    mut collisions: MessageReader<CollisionStart>,
    balls: Query<(), With<TennisBall>>,
    bodies: Query<(&Name, Has<BoundaryTag>)>,
    mut contacts: MessageWriter<BallContact>,
) {
    for collision in collisions.read() {
        let other = if balls.contains(collision.collider1) {
            collision.collider2
        } else if balls.contains(collision.collider2) {
            collision.collider1
        } else {
            continue;
        };

        let Ok((name, is_boundary)) = bodies.get(other) else {
            debug!("Ball touched unnamed entity {:?}", other);
            continue;
        };
        let tag = if is_boundary {
            rally::BOUNDARY_TAG
        } else {
            UNTAGGED
        };
        contacts.write(BallContact(CollisionEvent::new(name.as_str(), tag)));
    }
}

pub fn process_ball_contacts(
    mut contacts: MessageReader<BallContact>,
    mut tennis_match: ResMut<TennisMatch>,
    mut agents: Query<(Entity, &TennisAgent, &mut AgentEpisode)>,
    mut points: MessageWriter<PointScored>,
    mut episode_events: MessageWriter<EpisodeEnded>,
) {
    let mut point_scored = false;
    for contact in contacts.read() {
        let outcome = tennis_match.on_collision(&contact.0);
        if outcome.event == RallyEvent::Ignored {
            continue;
        }

        for (_, agent, mut episode) in agents.iter_mut() {
            let delta = outcome.rewards.get(agent.side);
            if delta != 0.0 {
                episode.add_reward(delta);
            }
        }

        let Some(winner) = outcome.point_winner else {
            debug!("Rally continues: {:?}", outcome.event);
            continue;
        };

        let score = tennis_match.score;
        info!(
            "🏆 Point to {:?} ({:?}), score A {} - B {} after {} rallies",
            winner,
            outcome.event,
            score.a,
            score.b,
            score.total()
        );
        for (entity, _, mut episode) in agents.iter_mut() {
            finish_episode(entity, &mut episode, &mut episode_events);
        }
        points.write(PointScored {
            winner,
            event: outcome.event,
            score,
        });
        point_scored = true;
        break;
    }

    // The ball is re-served; whatever else it touched this frame belongs to the old rally.
    if point_scored {
        contacts.clear();
    }
}

/// Every fixed step counts towards both agents' running episodes.
pub fn count_tennis_steps(mut agents: Query<&mut AgentEpisode, With<TennisAgent>>) {
    for mut episode in agents.iter_mut() {
        episode.record_step();
    }
}

pub fn reset_match_on_point(
    mut points: MessageReader<PointScored>,
    tennis_match: Res<TennisMatch>,
    mut balls: Query<
        (&mut Position, &mut LinearVelocity, &mut AngularVelocity),
        (With<TennisBall>, Without<TennisAgent>),
    >,
    mut agents: Query<(&TennisAgent, &mut Position, &mut LinearVelocity), Without<TennisBall>>,
) {
    if points.read().last().is_none() {
        return;
    }
    reset_tennis_area(&tennis_match, &mut balls, &mut agents);
}
