#[cfg(test)]
mod cli_tests {
    use crate::native::Cli;
    use crate::{LauncherConfig, Mode, load_config};
    use clap::Parser;
    use std::path::PathBuf;

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).expect("Temp config should be writable");
        path
    }

    #[test]
    fn test_parse_train_arguments() {
        let cli = Cli::try_parse_from([
            "launcher", "train", "--steps", "250", "--envs", "4", "--seed", "7",
        ])
        .expect("Arguments should parse");

        assert_eq!(cli.mode, Mode::Train);
        assert_eq!(cli.steps, 250);
        assert_eq!(cli.envs, Some(4));
        assert_eq!(cli.seed, Some(7));
        assert!(!cli.headless);
        assert!(!cli.heuristic);
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["launcher", "tennis", "--headless", "--heuristic"])
            .expect("Arguments should parse");

        assert_eq!(cli.mode, Mode::Tennis);
        assert!(cli.headless);
        assert!(cli.heuristic);
        assert_eq!(cli.steps, 10_000);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["launcher", "soccer"]).is_err());
        assert!(Cli::try_parse_from(["launcher"]).is_err());
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let cli = Cli::try_parse_from(["launcher", "train", "--envs", "3", "--seed", "11"])
            .expect("Arguments should parse");

        let options = cli.into_options().expect("Default config needs no file");

        assert_eq!(options.config.training.num_envs, 3);
        assert_eq!(options.config.training.seed, 11);
        assert_eq!(options.config.rewards, LauncherConfig::default().rewards);
        assert!(options.log);
    }

    #[test]
    fn test_load_config_from_file() {
        let path = temp_config(
            "launcher-config",
            r#"{ "training": { "num_envs": 6 }, "rewards": { "wall_hit": -0.2, "floor_hit": -0.01,
               "net_serve": -0.01, "double_hit": -0.01, "ball_miss": -0.5, "long_hit": -0.05,
               "over_net": 0.1, "resist_temptation": 0.5 } }"#,
        );

        let config = load_config(Some(&path));
        let _ = std::fs::remove_file(&path);
        let config = config.expect("Config should parse");

        assert_eq!(config.training.num_envs, 6);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(config.rewards.wall_hit, -0.2);
    }

    #[test]
    fn test_missing_config_file_names_the_path() {
        let path = PathBuf::from("/definitely/not/here/config.json");

        let error = load_config(Some(&path)).expect_err("Missing file must fail");

        assert!(
            error.to_string().contains("config.json"),
            "Error was: {}",
            error
        );
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let path = temp_config("launcher-bad-config", "{ not json");

        let result = load_config(Some(&path));
        let _ = std::fs::remove_file(&path);

        assert!(result.is_err());
    }
}
