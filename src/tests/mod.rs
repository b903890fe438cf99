mod config_tests;
mod key_derivation_tests;
