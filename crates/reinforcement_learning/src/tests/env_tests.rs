#[cfg(test)]
mod env_tests {
    use crate::env::{Environment, RollerEnv};
    use bevy::prelude::Vec3;
    use shared::input::DiscreteAction;

    const FAR_TARGET: Vec3 = Vec3::new(-4.0, 0.5, -4.0);

    fn env_with_far_target() -> RollerEnv {
        let mut env = RollerEnv::new(42, 1000);
        env.target_position = FAR_TARGET;
        env
    }

    #[test]
    fn test_new_env_starts_at_spawn() {
        let env = RollerEnv::new(42, 1000);
        assert_eq!(env.agent_position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(env.agent_velocity, Vec3::ZERO);
        assert!(env.target_position.x.abs() <= 4.0);
        assert!(env.target_position.z.abs() <= 4.0);
        assert_eq!(env.observation_size(), 8);
        assert_eq!(env.action_count(), DiscreteAction::COUNT);
    }

    #[test]
    fn test_idle_step_costs_a_little() {
        let mut env = env_with_far_target();

        let transition = env.step(DiscreteAction::NoAction.index());

        assert_eq!(transition.reward, -0.01);
        assert!(!transition.done);
        assert_eq!(env.agent_position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(transition.observation.len(), 8);
    }

    #[test]
    fn test_actions_accelerate_the_agent() {
        let mut env = env_with_far_target();

        env.step(DiscreteAction::Right.index());
        assert!(env.agent_velocity.x > 0.0);
        assert!(env.agent_position.x > 0.0);

        let mut env = env_with_far_target();
        env.step(DiscreteAction::Down.index());
        assert!(env.agent_velocity.z < 0.0);
        assert_eq!(env.agent_velocity.x, 0.0);
    }

    #[test]
    fn test_reaching_target_is_terminal() {
        let mut env = RollerEnv::new(42, 1000);
        env.target_position = env.agent_position + Vec3::new(1.0, 0.0, 0.0);

        let transition = env.step(DiscreteAction::NoAction.index());

        assert!(transition.done);
        assert!(!transition.truncated);
        assert!((transition.reward - 0.99).abs() < 1e-5);
    }

    #[test]
    fn test_agent_falls_off_the_edge() {
        let mut env = env_with_far_target();
        env.agent_position = Vec3::new(5.5, 0.5, 0.0);

        let mut last = None;
        for _ in 0..100 {
            let transition = env.step(DiscreteAction::NoAction.index());
            if transition.done {
                last = Some(transition);
                break;
            }
        }

        let transition = last.expect("Agent off the platform should fall");
        assert!((transition.reward + 2.01).abs() < 1e-5);
        assert!(env.agent_position.y < 0.0);

        let observation = env.reset();
        assert_eq!(env.agent_position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(env.agent_velocity, Vec3::ZERO);
        assert_eq!(env.steps, 0);
        assert_eq!(observation[3..6], [0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_step_limit_truncates_episode() {
        let mut env = RollerEnv::new(42, 3);
        env.target_position = FAR_TARGET;

        assert!(!env.step(0).done);
        assert!(!env.step(0).done);
        let transition = env.step(0);
        assert!(transition.done);
        assert!(transition.truncated);
        assert_eq!(transition.reward, -0.01);
    }

    #[test]
    fn test_reset_on_platform_keeps_agent() {
        let mut env = env_with_far_target();
        env.agent_position = Vec3::new(2.0, 0.5, 1.0);
        env.agent_velocity = Vec3::new(0.3, 0.0, 0.0);

        env.reset();

        assert_eq!(env.agent_position, Vec3::new(2.0, 0.5, 1.0));
        assert_eq!(env.agent_velocity, Vec3::new(0.3, 0.0, 0.0));
        assert_ne!(env.target_position, FAR_TARGET);
    }

    #[test]
    fn test_same_seed_same_rollout() {
        let mut first = RollerEnv::new(9, 1000);
        let mut second = RollerEnv::new(9, 1000);
        let actions = [1, 4, 4, 2, 0, 3];

        for action in actions {
            assert_eq!(first.step(action), second.step(action));
        }
        assert_eq!(first.reset(), second.reset());
    }
}
