//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 等待选项与等待结果
//!
//! 对应 waitpid() 的 options 参数 (include/uapi/linux/wait.h)

use bitflags::bitflags;

use super::pid::{Pid, PidError};

bitflags! {
    /// waitpid() 的 options 参数
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WaitOptions: i32 {
        /// 目标未退出时立即返回，不阻塞
        const WNOHANG = 0x00000001;
    }
}

impl WaitOptions {
    /// 从用户态传入的原始值构造
    ///
    /// 含有未知标志位时返回 `PidError::InvalidArgument`
    pub fn from_raw(raw: i32) -> Result<Self, PidError> {
        Self::from_bits(raw).ok_or(PidError::InvalidArgument)
    }

    /// 是否为非阻塞等待
    #[inline]
    pub fn is_nohang(self) -> bool {
        self.contains(Self::WNOHANG)
    }
}

/// join 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// 目标已退出
    Exited {
        /// 目标 PID
        pid: Pid,
        /// 退出状态
        status: i32,
    },
    /// WNOHANG 且目标尚未退出
    NotReady,
}
