//! 同步原语 (Synchronization Primitives)
//!
//! 进程表使用 `spin::Mutex` 作为表锁，这里补充与之配对的条件变量：
//! - `condvar` - 条件变量，wait() 释放表锁并等待 broadcast()

pub mod condvar;

pub use condvar::ConditionVariable;
