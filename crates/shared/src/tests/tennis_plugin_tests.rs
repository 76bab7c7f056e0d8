#[cfg(test)]
mod tennis_plugin_tests {
    use crate::agent::{AgentEpisode, EpisodeEnded};
    use crate::tennis::area::{
        AGENT_DEPTH, AGENT_HEIGHT, AGENT_SPEED, BALL_RADIUS, BoundaryTag, TennisAgent, TennisBall,
        agent_start_position, serve_position, tracking_velocity,
    };
    use crate::tennis::rally::*;
    use crate::tennis::{BallContact, TennisPlugin, UNTAGGED};
    use avian3d::prelude::{CollisionStart, LinearVelocity, Position};
    use bevy::ecs::message::Messages;
    use bevy::prelude::*;

    fn create_tennis_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        // Normally registered by the physics plugins.
        app.add_message::<CollisionStart>();
        app.add_plugins(TennisPlugin);
        app.update();
        app
    }

    fn agent_episode(app: &mut App, side: Side) -> AgentEpisode {
        let world = app.world_mut();
        let mut q = world.query::<(&TennisAgent, &AgentEpisode)>();
        q.iter(world)
            .find(|(agent, _)| agent.side == side)
            .map(|(_, episode)| episode.clone())
            .expect("Both agents should be spawned")
    }

    fn ball_entity(app: &mut App) -> Entity {
        let world = app.world_mut();
        let mut q = world.query_filtered::<Entity, With<TennisBall>>();
        q.single(world).expect("Exactly one ball")
    }

    fn named_entity(app: &mut App, name: &str) -> Entity {
        let world = app.world_mut();
        let mut q = world.query::<(Entity, &Name)>();
        q.iter(world)
            .find(|(_, entity_name)| entity_name.as_str() == name)
            .map(|(entity, _)| entity)
            .expect("Named entity should exist")
    }

    fn contact(app: &mut App, event: CollisionEvent) {
        app.world_mut().write_message(BallContact(event));
    }

    #[test]
    fn test_tennis_area_spawns_court() {
        let mut app = create_tennis_app();
        let world = app.world_mut();

        let boundaries = world
            .query_filtered::<&Name, With<BoundaryTag>>()
            .iter(world)
            .count();
        assert_eq!(boundaries, 9, "Two floors, six wall segments and the net");

        let agents = world.query::<&TennisAgent>().iter(world).count();
        assert_eq!(agents, 2);

        let balls = world.query::<&TennisBall>().iter(world).count();
        assert_eq!(balls, 1);

        assert_eq!(*world.resource::<TennisMatch>(), TennisMatch::default());
    }

    #[test]
    fn test_successful_serve_rewards_server() {
        let mut app = create_tennis_app();

        contact(&mut app, CollisionEvent::new(AGENT_A, UNTAGGED));
        contact(&mut app, CollisionEvent::boundary(FLOOR_B));
        app.update();

        let episode_a = agent_episode(&mut app, Side::A);
        let episode_b = agent_episode(&mut app, Side::B);
        assert_eq!(episode_a.cumulative_reward, 0.10);
        assert_eq!(episode_b.cumulative_reward, 0.0);
        assert_eq!(episode_a.completed_episodes, 0, "Rally still running");

        let tennis_match = app.world().resource::<TennisMatch>();
        assert_eq!(
            tennis_match.rally,
            RallyState {
                last_side_hit: Some(Side::A),
                floor_hit: FloorHit::Floor(Side::B),
                crossed_net: true,
            }
        );
    }

    #[test]
    fn test_point_ends_both_episodes_and_resets_area() {
        let mut app = create_tennis_app();
        let ball = ball_entity(&mut app);
        app.world_mut()
            .entity_mut(ball)
            .insert((Position::from(Vec3::new(3.0, 0.2, 1.0)), LinearVelocity(Vec3::X)));

        // Missed serve on A's side.
        contact(&mut app, CollisionEvent::boundary(FLOOR_A));
        app.update();

        let episode_a = agent_episode(&mut app, Side::A);
        let episode_b = agent_episode(&mut app, Side::B);
        assert_eq!(episode_a.completed_episodes, 1);
        assert_eq!(episode_a.last_episode_reward, Some(-0.01));
        assert_eq!(episode_a.cumulative_reward, 0.0, "New episode starts empty");
        assert_eq!(episode_b.completed_episodes, 1);
        assert_eq!(episode_b.last_episode_reward, Some(0.0));

        let tennis_match = app.world().resource::<TennisMatch>();
        assert_eq!(tennis_match.score, Score { a: 0, b: 1 });
        assert_eq!(tennis_match.rally, RallyState::service());

        let position = app.world().get::<Position>(ball).expect("Ball position");
        assert_eq!(position.0, serve_position(Side::B), "B serves the next rally");
        let velocity = app.world().get::<LinearVelocity>(ball).expect("Ball velocity");
        assert_eq!(velocity.0, Vec3::ZERO);
    }

    #[test]
    fn test_contacts_after_point_in_same_frame_are_dropped() {
        let mut app = create_tennis_app();

        contact(&mut app, CollisionEvent::boundary(FLOOR_A));
        contact(&mut app, CollisionEvent::boundary(WALL_A));
        app.update();
        app.update();

        let tennis_match = app.world().resource::<TennisMatch>();
        assert_eq!(tennis_match.score.total(), 1);
        assert_eq!(agent_episode(&mut app, Side::A).completed_episodes, 1);
    }

    #[test]
    fn test_unknown_contacts_change_nothing() {
        let mut app = create_tennis_app();

        contact(&mut app, CollisionEvent::new("Spectator", UNTAGGED));
        app.update();

        assert_eq!(
            *app.world().resource::<TennisMatch>(),
            TennisMatch::default()
        );
        let episode = agent_episode(&mut app, Side::A);
        assert_eq!(episode.cumulative_reward, 0.0);
        assert_eq!(episode.completed_episodes, 0);
    }

    #[test]
    fn test_tennis_episodes_count_fixed_steps() {
        let mut app = create_tennis_app();
        let before = agent_episode(&mut app, Side::A).step_count;
        for _ in 0..4 {
            app.world_mut().run_schedule(FixedUpdate);
        }
        assert_eq!(agent_episode(&mut app, Side::A).step_count, before + 4);

        contact(&mut app, CollisionEvent::boundary(FLOOR_A));
        app.update();

        let ended: Vec<EpisodeEnded> = app
            .world()
            .resource::<Messages<EpisodeEnded>>()
            .iter_current_update_messages()
            .cloned()
            .collect();
        assert_eq!(ended.len(), 2, "Both agents finish on a point");
        for episode in &ended {
            assert!(episode.steps >= 4, "Steps were lost: {:?}", episode);
        }
        assert_eq!(agent_episode(&mut app, Side::B).step_count, 0);
    }

    #[test]
    fn test_physics_collisions_are_forwarded_as_contacts() {
        let mut app = create_tennis_app();
        let ball = ball_entity(&mut app);
        let agent_b = named_entity(&mut app, AGENT_B);
        let floor_a = named_entity(&mut app, FLOOR_A);

        app.world_mut().write_message(CollisionStart {
            collider1: agent_b,
            collider2: ball,
            body1: Some(agent_b),
            body2: Some(ball),
        });
        app.world_mut().write_message(CollisionStart {
            collider1: ball,
            collider2: floor_a,
            body1: Some(ball),
            body2: Some(floor_a),
        });
        app.update();

        assert_eq!(
            agent_episode(&mut app, Side::B).cumulative_reward,
            0.10,
            "B served and the ball landed on A's floor"
        );
        let tennis_match = app.world().resource::<TennisMatch>();
        assert_eq!(tennis_match.rally.floor_hit, FloorHit::Floor(Side::A));
    }

    #[test]
    fn test_heuristic_moves_behind_the_ball() {
        let agent = agent_start_position(Side::A);
        let ball = Vec3::new(-5.0, 3.0, 2.0);

        let velocity = tracking_velocity(Side::A, agent, ball);

        assert!(velocity.x > 0.0, "A walks from the back towards the ball");
        assert!(velocity.z > 0.0);
        assert!(velocity.length() <= AGENT_SPEED + 1e-4);
    }

    #[test]
    fn test_heuristic_steps_in_when_the_ball_drops_low() {
        let waiting = Vec3::new(-6.25, AGENT_HEIGHT / 2.0, 0.0);

        let high = tracking_velocity(Side::A, waiting, Vec3::new(-6.0, 4.0, 0.0));
        assert!(high.length() < 1e-3, "A already waits under the ball, got {:?}", high);

        let low = tracking_velocity(Side::A, waiting, Vec3::new(-6.0, 2.4, 0.0));
        assert!(low.x > 0.0, "A steps towards the net, got {:?}", low);

        let mirrored = Vec3::new(6.25, AGENT_HEIGHT / 2.0, 0.0);
        let low_b = tracking_velocity(Side::B, mirrored, Vec3::new(6.0, 2.4, 0.0));
        assert!(low_b.x < 0.0, "B steps towards the net, got {:?}", low_b);
    }

    #[test]
    fn test_heuristic_reaches_a_dropped_serve() {
        let dt = 0.02;
        for server in [Side::A, Side::B] {
            let mut agent = agent_start_position(server);
            let mut ball = serve_position(server);
            let mut fall_speed = 0.0;
            while ball.y - BALL_RADIUS > AGENT_HEIGHT {
                agent += tracking_velocity(server, agent, ball) * dt;
                fall_speed += 9.81 * dt;
                ball.y -= fall_speed * dt;
            }

            let gap = (ball.x - agent.x).abs() - AGENT_DEPTH / 2.0;
            assert!(
                gap < BALL_RADIUS,
                "{:?} misses the serve by {} (agent {:?}, ball {:?})",
                server,
                gap - BALL_RADIUS,
                agent,
                ball
            );
        }
    }

    #[test]
    fn test_heuristic_stays_on_its_own_half() {
        let agent = agent_start_position(Side::B);
        let ball_on_other_half = Vec3::new(-6.0, 1.0, 0.0);

        let velocity = tracking_velocity(Side::B, agent, ball_on_other_half);
        let next = agent + velocity * 0.02;

        assert!(next.x > 0.0, "B never crosses the net, got {:?}", next);
        assert_eq!(velocity.y, 0.0);
    }
}
