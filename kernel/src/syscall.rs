//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程相关系统调用
//!
//! 这里是系统调用分发与进程表之间的胶水：参数检查、把 `PidError`
//! 转换为负的错误代码。返回值遵循系统调用约定，负数表示错误。

use log::{debug, warn};

use crate::errno::Errno;
use crate::process::{JoinOutcome, Pid, PidTable, WaitOptions};

/// 返回当前进程的 PID
pub fn sys_getpid(current: Pid) -> i32 {
    current as i32
}

/// 为新任务分配 PID 并启动它
///
/// `start` 收到新 PID 后负责创建并启动任务。启动失败时撤销分配的 PID，
/// 返回 `start` 给出的错误代码。
pub fn sys_fork<F>(table: &PidTable, current: Pid, start: F) -> i32
where
    F: FnOnce(Pid) -> Result<(), Errno>,
{
    let pid = match table.allocate(current) {
        Ok(pid) => pid,
        Err(err) => {
            debug!("sys_fork: pid allocation failed: {}", err);
            return Errno::from(err).as_neg_i32();
        }
    };

    match start(pid) {
        Ok(()) => {
            debug!("sys_fork: created process with PID {}", pid);
            pid as i32
        }
        Err(errno) => {
            // 任务没有运行过，可以直接撤销
            table.unallocate(pid, current);
            debug!("sys_fork: task start failed ({:?}), pid {} released", errno, pid);
            errno.as_neg_i32()
        }
    }
}

/// 等待子进程退出
///
/// # 返回
/// * 子进程 PID，退出状态写入 `status`
/// * `0` - 带 WNOHANG 且子进程尚未退出，`status` 不变
/// * `-EINVAL` - 未知的 options
/// * `-EFAULT` - 没有提供 status
/// * `-ECHILD` - `pid` 不是当前进程的子进程，或等待自己
/// * 其他负数 - join 返回的错误
pub fn sys_waitpid(
    table: &PidTable,
    current: Pid,
    pid: i32,
    status: Option<&mut i32>,
    options: i32,
) -> i32 {
    let options = match WaitOptions::from_raw(options) {
        Ok(options) => options,
        Err(err) => {
            warn!("sys_waitpid: rejected options {:#x}", options);
            return Errno::from(err).as_neg_i32();
        }
    };

    let status = match status {
        Some(status) => status,
        None => return Errno::BadAddress.as_neg_i32(),
    };

    // 不支持 pid <= 0 的进程组等待
    let target = match Pid::try_from(pid) {
        Ok(target) => target,
        Err(_) => return Errno::NoChild.as_neg_i32(),
    };

    if !table.is_parent_of(target, current) {
        debug!("sys_waitpid: pid {} is not a child of {}", target, current);
        return Errno::NoChild.as_neg_i32();
    }

    if target == current {
        return Errno::NoChild.as_neg_i32();
    }

    match table.join(current, target, options) {
        Ok(JoinOutcome::Exited { pid, status: code }) => {
            *status = code;
            pid as i32
        }
        Ok(JoinOutcome::NotReady) => 0,
        Err(err) => Errno::from(err).as_neg_i32(),
    }
}

/// 正常退出，子进程保持与本进程的父子关系
pub fn sys_exit(table: &PidTable, current: Pid, status: i32) {
    debug!("sys_exit: pid {} exiting with code {}", current, status);
    table.record_exit(current, status, false);
}

/// 强制退出，同时分离所有子进程，它们退出后立即回收
pub fn sys_abort(table: &PidTable, current: Pid, status: i32) {
    debug!("sys_abort: pid {} killed with code {}", current, status);
    table.record_exit(current, status, true);
}
