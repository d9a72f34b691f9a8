//! 进程表性质测试
//!
//! 对任意 allocate / unallocate / exit / detach 操作序列：
//! - 同时存在的 PID 互不相同，且各自占用不同的槽位
//! - len() 等于存活记录数
//! - 表满时 allocate 返回 ResourceExhausted 且表不变

use std::collections::BTreeMap;

use proptest::prelude::*;
use rux_pid::{PidError, PidState, PidTable, PidTableConfig, Pid};

const BOOT: Pid = 1;
const CAPACITY: usize = 8;

#[derive(Debug, Clone)]
enum Op {
    Allocate,
    Unallocate(usize),
    Exit(usize, bool),
    Detach(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Allocate),
        1 => any::<usize>().prop_map(Op::Unallocate),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(i, d)| Op::Exit(i, d)),
        2 => any::<usize>().prop_map(Op::Detach),
    ]
}

fn new_table() -> PidTable {
    PidTable::new(PidTableConfig {
        capacity: CAPACITY,
        pid_min: 2,
        pid_max: 40,
        bootup_pid: BOOT,
    })
    .unwrap()
}

/// 测试侧维护的模型：pid -> 是否已退出、父进程
#[derive(Debug, Clone, Copy)]
struct Model {
    exited: bool,
    parent: Option<Pid>,
}

fn pick(live: &BTreeMap<Pid, Model>, index: usize) -> Option<Pid> {
    if live.is_empty() {
        None
    } else {
        live.keys().nth(index % live.len()).copied()
    }
}

fn expected_state(model: &Model) -> PidState {
    match (model.exited, model.parent.is_some()) {
        (false, true) => PidState::Live,
        (true, true) => PidState::Zombie,
        (false, false) => PidState::Orphan,
        (true, false) => PidState::Collectible,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// 任意操作序列后，表与模型一致
    #[test]
    fn table_matches_model(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let table = new_table();
        let mut live: BTreeMap<Pid, Model> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Allocate => {
                    // 新进程的父进程是某个存活进程，没有时用启动进程
                    let creator = live
                        .iter()
                        .find(|(_, m)| !m.exited)
                        .map(|(&pid, _)| pid)
                        .unwrap_or(BOOT);
                    let before = table.len();
                    match table.allocate(creator) {
                        Ok(pid) => {
                            prop_assert!(!live.contains_key(&pid));
                            live.insert(pid, Model { exited: false, parent: Some(creator) });
                        }
                        Err(err) => {
                            prop_assert_eq!(err, PidError::ResourceExhausted);
                            prop_assert_eq!(before, CAPACITY);
                            prop_assert_eq!(table.len(), CAPACITY);
                        }
                    }
                }
                Op::Unallocate(index) => {
                    // 只撤销未退出且未分离的进程
                    let candidate = live
                        .iter()
                        .filter(|(_, m)| !m.exited && m.parent.is_some())
                        .map(|(&pid, m)| (pid, m.parent))
                        .nth(index % CAPACITY);
                    if let Some((pid, Some(parent))) = candidate {
                        table.unallocate(pid, parent);
                        live.remove(&pid);
                    }
                }
                Op::Exit(index, detach_children) => {
                    if let Some(pid) = pick(&live, index) {
                        if live[&pid].exited {
                            continue;
                        }
                        table.record_exit(pid, pid as i32, detach_children);
                        if detach_children {
                            for model in live.values_mut() {
                                if model.parent == Some(pid) {
                                    model.parent = None;
                                }
                            }
                        }
                        if let Some(model) = live.get_mut(&pid) {
                            model.exited = true;
                        }
                    }
                }
                Op::Detach(index) => {
                    if let Some(pid) = pick(&live, index) {
                        let result = table.detach(pid);
                        if live[&pid].parent.is_some() {
                            prop_assert_eq!(result, Ok(()));
                            if let Some(model) = live.get_mut(&pid) {
                                model.parent = None;
                            }
                        } else {
                            prop_assert_eq!(result, Err(PidError::InvalidArgument));
                        }
                    }
                }
            }

            // 可回收的记录已被移除
            live.retain(|_, m| expected_state(m) != PidState::Collectible);

            prop_assert_eq!(table.len(), live.len() + 1);
            for (&pid, model) in &live {
                prop_assert!(table.exists(pid));
                prop_assert_eq!(table.state(pid), Some(expected_state(model)));
                prop_assert_eq!(table.parent_of(pid), Some(model.parent));
            }

            let mut slots: Vec<usize> = live.keys().map(|&pid| pid as usize % CAPACITY).collect();
            slots.push(BOOT as usize % CAPACITY);
            slots.sort_unstable();
            slots.dedup();
            prop_assert_eq!(slots.len(), live.len() + 1);
        }
    }

    /// 退出后父进程非阻塞 join 得到相同的状态
    #[test]
    fn nohang_join_returns_exit_status(status in any::<i32>()) {
        let table = new_table();
        let child = table.allocate(BOOT).unwrap();
        table.record_exit(child, status, false);

        let outcome = table.join(BOOT, child, rux_pid::WaitOptions::WNOHANG);
        prop_assert_eq!(outcome, Ok(rux_pid::JoinOutcome::Exited { pid: child, status }));
    }

    /// 非父进程的 join 总是失败
    #[test]
    fn non_parent_join_rejected(exit_first in any::<bool>(), status in any::<i32>()) {
        let table = new_table();
        let parent = table.allocate(BOOT).unwrap();
        let child = table.allocate(parent).unwrap();
        let stranger = table.allocate(BOOT).unwrap();

        if exit_first {
            table.record_exit(child, status, false);
        }

        for caller in [BOOT, stranger] {
            prop_assert_eq!(
                table.join(caller, child, rux_pid::WaitOptions::WNOHANG),
                Err(PidError::NotYourChild)
            );
        }
    }
}
