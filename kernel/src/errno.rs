//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程管理相关的错误代码
//!
//! 取值与 include/uapi/asm-generic/errno-base.h 一致，
//! 进程表内部错误通过 `From<PidError>` 转换为这里的代码后再返回给用户态。

use crate::process::PidError;

/// 进程相关系统调用使用的错误代码
///
/// 使用方法：
/// ```rust
/// use rux_pid::errno::Errno;
///
/// // 系统调用风格，返回负数
/// assert_eq!(Errno::NoChild.as_neg_i32(), -10);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// No such process (ESRCH, 3)
    NoSuchProcess = 3,

    /// No child process (ECHILD, 10)
    NoChild = 10,

    /// Try again (EAGAIN, 11)
    TryAgain = 11,

    /// Out of memory (ENOMEM, 12)
    OutOfMemory = 12,

    /// Bad address (EFAULT, 14)
    BadAddress = 14,

    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,

    /// Resource deadlock would occur (EDEADLK, 35)
    Deadlock = 35,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（用于系统调用返回）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }
}

impl From<PidError> for Errno {
    fn from(err: PidError) -> Self {
        match err {
            PidError::ResourceExhausted => Errno::TryAgain,
            PidError::OutOfMemory => Errno::OutOfMemory,
            PidError::NoSuchProcess => Errno::NoSuchProcess,
            PidError::InvalidArgument => Errno::InvalidArgument,
            PidError::WouldDeadlock => Errno::Deadlock,
            PidError::NotYourChild => Errno::NoChild,
        }
    }
}

/// 常用的错误代码常量
pub mod constants {
    pub const ESRCH: i32 = 3;
    pub const ECHILD: i32 = 10;
    pub const EAGAIN: i32 = 11;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EINVAL: i32 = 22;
    pub const EDEADLK: i32 = 35;
}
