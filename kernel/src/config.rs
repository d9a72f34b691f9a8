//! Rux PID 子系统配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 进程表配置
// ============================================================

/// 进程表槽位数
pub const PROCS_MAX: usize = 128;

/// 最小可分配 PID
pub const PID_MIN: u32 = 2;

/// 最大可分配 PID
pub const PID_MAX: u32 = 32767;

/// 启动进程 PID
pub const BOOTUP_PID: u32 = 1;

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "info";

/// 将 `LOG_LEVEL` 转换为 `log::LevelFilter`
///
/// 未知的级别字符串按 `Info` 处理
pub fn log_level() -> log::LevelFilter {
    match LOG_LEVEL {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_ranges() {
        assert!(PROCS_MAX > 0);
        assert!(PID_MIN > 0);
        assert!(PID_MAX >= PID_MIN);
        assert!(BOOTUP_PID < PID_MIN || BOOTUP_PID > PID_MAX);
    }

    #[test]
    fn test_log_level_parses() {
        assert!(log_level() <= log::LevelFilter::Trace);
    }
}
