//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! Rux 进程 ID 与生命周期管理
//!
//! - `process`: 进程表（PID 分配、退出记录、分离、等待）
//! - `sync`: 与表锁配对的条件变量
//! - `syscall`: getpid/fork/waitpid/exit 的系统调用胶水
//! - `errno`: 错误代码
//! - `config`: 由 build.rs 根据 Kernel.toml 生成的配置

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod errno;
pub mod process;
pub mod sync;
pub mod syscall;

#[cfg(test)]
mod tests;

pub use process::{JoinOutcome, Pid, PidError, PidState, PidTable, PidTableConfig, WaitOptions};
