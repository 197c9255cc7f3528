pub mod adb;
pub mod capture_loop;
pub mod cli;
pub mod command_loop;
pub mod config;
pub mod console;
pub mod error;
pub mod frame;
pub mod gesture;
pub mod keys;
pub mod launcher;
pub mod logging;
pub mod models;
pub mod session;
pub mod signal;
pub mod translate;
