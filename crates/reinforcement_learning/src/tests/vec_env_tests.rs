#[cfg(test)]
mod vec_env_tests {
    use crate::env::RollerEnv;
    use crate::vec_env::VecEnv;
    use bevy::prelude::Vec3;

    fn vec_env(count: usize) -> VecEnv<RollerEnv> {
        let envs = (0..count)
            .map(|index| {
                let mut env = RollerEnv::new(index as u64, 1000);
                env.target_position = Vec3::new(-4.0, 0.5, -4.0);
                env
            })
            .collect();
        VecEnv::new(envs)
    }

    #[test]
    fn test_reset_returns_one_observation_per_env() {
        let mut envs = vec_env(4);
        let observations = envs.reset();

        assert_eq!(envs.num_envs(), 4);
        assert_eq!(envs.observation_size(), 8);
        assert_eq!(envs.action_count(), 5);
        assert_eq!(observations.len(), 4);
        assert!(observations.iter().all(|o| o.len() == 8));
    }

    #[test]
    fn test_reset_individual() {
        let mut envs = vec_env(2);
        envs.envs_mut()[1].steps = 12;

        let observation = envs.reset_individual(1).expect("Index in range");
        assert_eq!(observation.len(), 8);
        assert_eq!(envs.envs()[1].steps, 0);
        assert_eq!(envs.reset_individual(2), None);
    }

    #[test]
    fn test_finished_env_is_reset_automatically() {
        let mut envs = vec_env(3);
        let agent = envs.envs()[1].agent_position;
        envs.envs_mut()[1].target_position = agent + Vec3::new(0.5, 0.0, 0.0);

        let transitions = envs.step(&[0, 0, 0]);

        assert_eq!(transitions.len(), 3);
        assert!(!transitions[0].done);
        assert_eq!(transitions[0].terminal_observation, None);

        let finished = &transitions[1];
        assert!(finished.done);
        assert!((finished.reward - 0.99).abs() < 1e-5);
        let terminal = finished
            .terminal_observation
            .as_ref()
            .expect("Terminal observation kept");
        assert_eq!(terminal[0], agent.x + 0.5);
        assert_ne!(&finished.observation, terminal, "Target moved for the new episode");
        assert_eq!(envs.envs()[1].steps, 0);
    }

    #[test]
    fn test_missing_actions_default_to_no_action() {
        let mut envs = vec_env(3);

        let transitions = envs.step(&[4]);

        assert_eq!(transitions.len(), 3);
        assert!(envs.envs()[0].agent_velocity.x > 0.0);
        assert_eq!(envs.envs()[2].agent_velocity, Vec3::ZERO);
    }
}
