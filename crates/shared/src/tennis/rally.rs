//! Rally state machine for the two-player tennis arena.
//!
//! Every ball contact is classified against the current rally and turned into reward deltas for
//! one or both sides, plus an optional point decision. Nothing in here touches the ECS; the
//! plugin in [`crate::tennis`] feeds it collision events and applies what comes back.

use bevy::prelude::{Resource, debug};
use serde::{Deserialize, Serialize};

/// Tag carried by every game-boundary collider (walls, floors, net).
pub const BOUNDARY_TAG: &str = "iWall";

pub const WALL_A: &str = "wallA";
pub const WALL_B: &str = "wallB";
pub const FLOOR_A: &str = "floorA";
pub const FLOOR_B: &str = "floorB";
pub const NET: &str = "net";
pub const AGENT_A: &str = "AgentA";
pub const AGENT_B: &str = "AgentB";

// ============================================================================
// TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Where the ball last bounced since it last left a racket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorHit {
    /// Nobody has returned the serve yet.
    #[default]
    Service,
    Unset,
    Floor(Side),
}

/// What the ball struck, after resolving the raw collision event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    Wall(Side),
    Floor(Side),
    Net,
    Agent(Side),
}

/// Raw collision notification as delivered by the physics layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub object_name: String,
    pub tag: String,
}

impl CollisionEvent {
    pub fn new(object_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            tag: tag.into(),
        }
    }

    pub fn boundary(object_name: impl Into<String>) -> Self {
        Self::new(object_name, BOUNDARY_TAG)
    }

    /// Boundary objects are recognized by name only when tagged; agent bodies by name alone.
    pub fn contact(&self) -> Option<Contact> {
        if self.tag == BOUNDARY_TAG {
            match self.object_name.as_str() {
                WALL_A => Some(Contact::Wall(Side::A)),
                WALL_B => Some(Contact::Wall(Side::B)),
                FLOOR_A => Some(Contact::Floor(Side::A)),
                FLOOR_B => Some(Contact::Floor(Side::B)),
                NET => Some(Contact::Net),
                _ => None,
            }
        } else {
            match self.object_name.as_str() {
                AGENT_A => Some(Contact::Agent(Side::A)),
                AGENT_B => Some(Contact::Agent(Side::B)),
                _ => None,
            }
        }
    }
}

/// Signed reward for each kind of rally event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    /// Hitting into your own wall.
    pub wall_hit: f32,
    /// Hitting into your own floor, letting it double bounce or missing the serve.
    pub floor_hit: f32,
    pub net_serve: f32,
    pub double_hit: f32,
    pub ball_miss: f32,
    pub long_hit: f32,
    pub over_net: f32,
    /// Letting an opponent's long shot go instead of blocking it.
    pub resist_temptation: f32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            wall_hit: -0.01,
            floor_hit: -0.01,
            net_serve: -0.01,
            double_hit: -0.01,
            ball_miss: -0.50,
            long_hit: -0.05,
            over_net: 0.10,
            resist_temptation: 0.50,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SideRewards {
    pub a: f32,
    pub b: f32,
}

impl SideRewards {
    pub fn get(&self, side: Side) -> f32 {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    pub fn add(&mut self, side: Side, delta: f32) {
        match side {
            Side::A => self.a += delta,
            Side::B => self.b += delta,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub a: u32,
    pub b: u32,
}

impl Score {
    pub fn total(&self) -> u32 {
        self.a + self.b
    }

    fn award(&mut self, side: Side) {
        match side {
            Side::A => self.a += 1,
            Side::B => self.b += 1,
        }
    }
}

/// Named classification of a processed contact, mostly for logs and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyEvent {
    WallHit(Side),
    BallMiss(Side),
    LongHit(Side),
    FloorHit(Side),
    NetServe(Side),
    DoubleHit(Side),
    /// Ball landed on the given side after a legal shot from the other side.
    Landed(Side),
    /// The given side touched the ball.
    Hit(Side),
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RallyOutcome {
    pub rewards: SideRewards,
    pub point_winner: Option<Side>,
    pub event: RallyEvent,
}

impl RallyOutcome {
    fn ignored() -> Self {
        Self {
            rewards: SideRewards::default(),
            point_winner: None,
            event: RallyEvent::Ignored,
        }
    }

    fn point(event: RallyEvent, winner: Side, rewards: SideRewards) -> Self {
        Self {
            rewards,
            point_winner: Some(winner),
            event,
        }
    }

    fn play_on(event: RallyEvent, rewards: SideRewards) -> Self {
        Self {
            rewards,
            point_winner: None,
            event,
        }
    }
}

fn reward_for(side: Side, delta: f32) -> SideRewards {
    let mut rewards = SideRewards::default();
    rewards.add(side, delta);
    rewards
}

// ============================================================================
// RALLY STATE - pure transitions
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyState {
    pub last_side_hit: Option<Side>,
    pub floor_hit: FloorHit,
    pub crossed_net: bool,
}

impl Default for RallyState {
    fn default() -> Self {
        Self::service()
    }
}

impl RallyState {
    /// State at the start of every rally.
    pub fn service() -> Self {
        Self {
            last_side_hit: None,
            floor_hit: FloorHit::Service,
            crossed_net: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::service();
    }

    /// Classify one contact and advance the rally. Does not touch the score; a returned
    /// `point_winner` means the caller must end the rally.
    pub fn on_contact(&mut self, contact: Contact, table: &RewardTable) -> RallyOutcome {
        match contact {
            Contact::Wall(side) => self.on_wall(side, table),
            Contact::Floor(side) => self.on_floor(side, table),
            Contact::Net => self.on_net(table),
            Contact::Agent(side) => self.on_agent(side, table),
        }
    }

    fn on_wall(&mut self, side: Side, table: &RewardTable) -> RallyOutcome {
        let opponent = side.opponent();
        if self.last_side_hit == Some(side) {
            RallyOutcome::point(
                RallyEvent::WallHit(side),
                opponent,
                reward_for(side, table.wall_hit),
            )
        } else if self.floor_hit == FloorHit::Floor(side) {
            RallyOutcome::point(
                RallyEvent::BallMiss(side),
                opponent,
                reward_for(side, table.ball_miss),
            )
        } else {
            let mut rewards = reward_for(side, table.resist_temptation);
            rewards.add(opponent, table.long_hit);
            RallyOutcome::point(RallyEvent::LongHit(opponent), side, rewards)
        }
    }

    fn on_floor(&mut self, side: Side, table: &RewardTable) -> RallyOutcome {
        if self.last_side_hit == Some(side)
            || self.floor_hit == FloorHit::Floor(side)
            || self.floor_hit == FloorHit::Service
        {
            return RallyOutcome::point(
                RallyEvent::FloorHit(side),
                side.opponent(),
                reward_for(side, table.floor_hit),
            );
        }

        self.floor_hit = FloorHit::Floor(side);
        // First legal bounce of the rally completes the serve.
        self.crossed_net = true;
        RallyOutcome::play_on(
            RallyEvent::Landed(side),
            reward_for(side.opponent(), table.over_net),
        )
    }

    fn on_net(&mut self, table: &RewardTable) -> RallyOutcome {
        if self.crossed_net {
            return RallyOutcome::ignored();
        }
        match self.last_side_hit {
            Some(server) => RallyOutcome::point(
                RallyEvent::NetServe(server),
                server.opponent(),
                reward_for(server, table.net_serve),
            ),
            None => {
                // Nobody has served yet; not expected to happen in play.
                debug!("Net contact before any serve, ignoring");
                RallyOutcome::ignored()
            }
        }
    }

    fn on_agent(&mut self, side: Side, table: &RewardTable) -> RallyOutcome {
        if self.last_side_hit == Some(side) {
            return RallyOutcome::point(
                RallyEvent::DoubleHit(side),
                side.opponent(),
                reward_for(side, table.double_hit),
            );
        }

        let mut rewards = SideRewards::default();
        if self.floor_hit != FloorHit::Service {
            self.crossed_net = true;
            // Volley straight from the opponent's racket. A return after a bounce on our own
            // floor was already rewarded when the ball landed, so it earns nothing here.
            if self.floor_hit == FloorHit::Unset {
                rewards.add(side.opponent(), table.over_net);
            }
        }
        self.last_side_hit = Some(side);
        self.floor_hit = FloorHit::Unset;
        RallyOutcome::play_on(RallyEvent::Hit(side), rewards)
    }
}

// ============================================================================
// MATCH CONTEXT
// ============================================================================

/// Match-level owner of the rally state and the cumulative score.
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TennisMatch {
    pub rally: RallyState,
    pub score: Score,
    pub rewards: RewardTable,
}

impl TennisMatch {
    pub fn new(rewards: RewardTable) -> Self {
        Self {
            rewards,
            ..Default::default()
        }
    }

    /// Process one raw collision event. Unrecognized objects are a no-op. When the outcome
    /// names a winner the point has already been recorded and a fresh rally begun.
    pub fn on_collision(&mut self, event: &CollisionEvent) -> RallyOutcome {
        let Some(contact) = event.contact() else {
            return RallyOutcome::ignored();
        };
        let outcome = self.rally.on_contact(contact, &self.rewards);
        if let Some(winner) = outcome.point_winner {
            self.resolve_point(winner);
        }
        outcome
    }

    pub fn resolve_point(&mut self, winner: Side) {
        self.score.award(winner);
        self.rally.reset();
    }

    /// Side serving the next rally; alternates every point starting with A.
    pub fn server(&self) -> Side {
        if self.score.total() % 2 == 0 {
            Side::A
        } else {
            Side::B
        }
    }
}
