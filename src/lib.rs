//! Library side of `pomo`: the pomodoro state machine, its flat-file store
//! and the terminal interface built on top of them.

pub mod commands;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod pomodoro;
pub mod scheduler;
pub mod storage;
pub mod timer;
pub mod tui;
