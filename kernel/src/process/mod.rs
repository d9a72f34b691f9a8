//! 进程管理模块
//!
//! - `pid`: 进程表，负责 PID 分配、父子关系、退出状态和等待
//! - `wait`: 等待选项与等待结果

pub mod pid;
pub mod wait;

pub use pid::{Pid, PidError, PidState, PidTable, PidTableConfig, INVALID_PID};
pub use wait::{JoinOutcome, WaitOptions};
