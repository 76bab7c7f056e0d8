mod env_tests;
mod vec_env_tests;
