//! Rux PID 子系统构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml 配置文件（或 menuconfig 生成的 build/.config）
//! 2. 生成 src/config.rs
//! 3. 导出日志级别等环境变量

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// 默认进程表槽位数
const DEFAULT_PROCS_MAX: i64 = 128;
/// 默认最小可分配 PID
const DEFAULT_PID_MIN: i64 = 2;
/// 默认最大可分配 PID
const DEFAULT_PID_MAX: i64 = 32767;
/// 默认启动进程 PID
const DEFAULT_BOOTUP_PID: i64 = 1;

/// 解析 build/.config 文件（简单 key=value 格式）
fn parse_dot_config(content: &str) -> toml::Value {
    let mut sections: HashMap<String, HashMap<String, toml::Value>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // 跳过注释和空行
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // 解析 section_key=value 格式，section 取第一个下划线之前的部分
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');

            if let Some((section, config_key)) = key.trim().split_once('_') {
                let parsed_value = if value == "true" {
                    toml::Value::Boolean(true)
                } else if value == "false" {
                    toml::Value::Boolean(false)
                } else if let Ok(int_val) = value.parse::<i64>() {
                    toml::Value::Integer(int_val)
                } else {
                    toml::Value::String(value.to_string())
                };

                sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(config_key.to_string(), parsed_value);
            }
        }
    }

    let mut root_map = toml::map::Map::new();
    for (section_name, section_data) in sections {
        let toml_map: toml::map::Map<String, toml::Value> = section_data.into_iter().collect();
        root_map.insert(section_name, toml::Value::Table(toml_map));
    }

    toml::Value::Table(root_map)
}

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=../build/.config");
    println!("cargo:rerun-if-changed=build.rs");

    // 优先使用 build/.config，其次 Kernel.toml，都没有时使用默认值
    let config = if let Ok(content) = fs::read_to_string("../build/.config") {
        println!("cargo:warning=Using build/.config configuration");
        parse_dot_config(&content)
    } else if let Ok(content) = fs::read_to_string("../Kernel.toml") {
        toml::from_str(&content).expect("Kernel.toml 解析失败")
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    let log_level = config
        .get("debug")
        .and_then(|d| d.get("log_level"))
        .and_then(|v| v.as_str())
        .unwrap_or("info")
        .to_string();

    println!("cargo:rustc-env=RUX_LOG_LEVEL={}", log_level);

    generate_config_code(&config, &log_level);
}

/// 读取 `[process]` 中的整数项
fn process_value(config: &toml::Value, key: &str, default: i64) -> i64 {
    config
        .get("process")
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

fn generate_config_code(config: &toml::Value, log_level: &str) {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let procs_max = process_value(config, "procs_max", DEFAULT_PROCS_MAX);
    let pid_min = process_value(config, "pid_min", DEFAULT_PID_MIN);
    let pid_max = process_value(config, "pid_max", DEFAULT_PID_MAX);
    let bootup_pid = process_value(config, "bootup_pid", DEFAULT_BOOTUP_PID);

    if procs_max <= 0 || pid_min <= 0 || pid_max < pid_min || bootup_pid <= 0 {
        panic!(
            "无效的进程配置: procs_max={} pid_min={} pid_max={} bootup_pid={}",
            procs_max, pid_min, pid_max, bootup_pid
        );
    }

    let config_code = format!(
        r#"//! Rux PID 子系统配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 进程表配置
// ============================================================

/// 进程表槽位数
pub const PROCS_MAX: usize = {};

/// 最小可分配 PID
pub const PID_MIN: u32 = {};

/// 最大可分配 PID
pub const PID_MAX: u32 = {};

/// 启动进程 PID
pub const BOOTUP_PID: u32 = {};

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "{}";
"#,
        procs_max, pid_min, pid_max, bootup_pid, log_level,
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let content = config_code + CONFIG_TAIL;
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != content {
        fs::write(&config_file, &content).expect("写入配置文件失败");
    }
}

/// 附加在生成常量之后的手写部分
const CONFIG_TAIL: &str = r#"
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
"#;
