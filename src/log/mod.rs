pub mod run_log;
