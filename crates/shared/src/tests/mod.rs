mod tennis_plugin_tests;
