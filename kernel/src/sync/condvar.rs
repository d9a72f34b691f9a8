//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 条件变量 (Condition Variable) 机制
//!
//! 和 POSIX 的 `pthread_cond_t` 语义一致：
//! - 条件变量必须与互斥锁配合使用
//! - wait() 释放锁并等待，被唤醒后重新获取锁
//! - broadcast() 唤醒所有等待者
//!
//! 实现方式：每次 broadcast() 递增唤醒序号。等待者在持有锁时记下当前序号，
//! 释放锁后自旋直到序号变化。broadcast() 必须在持有配对的锁时调用，
//! 因此记录序号与释放锁之间不会漏掉唤醒。
//!
//! 允许伪唤醒，调用者被唤醒后必须重新检查条件。

use core::sync::atomic::{AtomicUsize, Ordering};

use spin::relax::{RelaxStrategy, Spin};
use spin::{Mutex, MutexGuard};

/// 条件变量
///
/// # 使用示例
/// ```
/// use rux_pid::sync::ConditionVariable;
/// use spin::Mutex;
///
/// let lock = Mutex::new(true);
/// let cond = ConditionVariable::new();
///
/// let mut ready = lock.lock();
/// while !*ready {
///     ready = cond.wait(ready, &lock);
/// }
/// ```
pub struct ConditionVariable {
    /// 唤醒序号，每次 broadcast() 加一
    seq: AtomicUsize,
    /// 当前等待者数量
    waiters: AtomicUsize,
}

impl ConditionVariable {
    /// 创建新条件变量
    pub const fn new() -> Self {
        Self {
            seq: AtomicUsize::new(0),
            waiters: AtomicUsize::new(0),
        }
    }

    /// 等待条件满足（不可中断）
    ///
    /// # 参数
    /// * `guard` - `mutex` 的锁守卫，调用者必须持有锁
    /// * `mutex` - 关联的互斥锁
    ///
    /// # 行为
    /// 1. 记录当前唤醒序号
    /// 2. 释放互斥锁
    /// 3. 自旋等待序号变化
    /// 4. 重新获取互斥锁并返回新的守卫
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        let ticket = self.seq.load(Ordering::Acquire);
        self.waiters.fetch_add(1, Ordering::AcqRel);

        drop(guard);

        while self.seq.load(Ordering::Acquire) == ticket {
            Spin::relax();
        }

        self.waiters.fetch_sub(1, Ordering::AcqRel);
        mutex.lock()
    }

    /// 唤醒所有等待者
    ///
    /// 调用者必须持有与 wait() 配对的锁
    pub fn broadcast(&self) {
        self.seq.fetch_add(1, Ordering::AcqRel);
    }

    /// 当前等待者数量
    pub fn waiters(&self) -> usize {
        self.waiters.load(Ordering::Acquire)
    }
}

/// 默认实现
impl Default for ConditionVariable {
    fn default() -> Self {
        Self::new()
    }
}
