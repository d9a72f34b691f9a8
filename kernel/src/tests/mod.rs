//! 进程表场景测试
//!
//! 单个模块的单元测试放在各自文件中，这里是跨模块的场景：
//! - `lifecycle`: 退出、分离、回收的组合顺序
//! - `join_wakeup`: 多线程下阻塞 join 的唤醒

mod lifecycle;

use crate::process::{Pid, PidTable, PidTableConfig};

/// 启动进程 PID
pub(crate) const BOOT: Pid = 1;

/// 创建一个小容量的进程表
pub(crate) fn table_with_capacity(capacity: usize) -> PidTable {
    PidTable::new(PidTableConfig {
        capacity,
        pid_min: 2,
        pid_max: 1000,
        bootup_pid: BOOT,
    })
    .unwrap()
}
