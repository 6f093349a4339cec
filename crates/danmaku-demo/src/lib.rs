#![forbid(unsafe_code)]

//! Interactive terminal showcase for the danmaku scheduler.

pub mod app;
pub mod cli;
pub mod logging;
pub mod producer;
pub mod session;
