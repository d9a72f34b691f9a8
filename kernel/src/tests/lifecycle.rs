//! 退出、分离、回收的组合顺序

use super::{table_with_capacity, BOOT};
use crate::process::{JoinOutcome, PidError, PidState, WaitOptions};

#[test]
fn test_exit_then_nohang_join_returns_status() {
    let table = table_with_capacity(16);
    let child = table.allocate(BOOT).unwrap();

    table.record_exit(child, 123, false);

    assert_eq!(
        table.join(BOOT, child, WaitOptions::WNOHANG),
        Ok(JoinOutcome::Exited {
            pid: child,
            status: 123
        })
    );
}

#[test]
fn test_self_join_always_deadlocks() {
    let table = table_with_capacity(16);
    let parent = table.allocate(BOOT).unwrap();
    let child = table.allocate(parent).unwrap();

    for options in [WaitOptions::empty(), WaitOptions::WNOHANG] {
        assert_eq!(table.join(child, child, options), Err(PidError::WouldDeadlock));
    }

    table.record_exit(child, 0, false);
    assert_eq!(
        table.join(child, child, WaitOptions::empty()),
        Err(PidError::WouldDeadlock)
    );

    table.detach(child).unwrap();
    table.detach(parent).unwrap();
    // child 已被回收
    assert_eq!(
        table.join(child, child, WaitOptions::empty()),
        Err(PidError::NoSuchProcess)
    );
    assert_eq!(
        table.join(parent, parent, WaitOptions::empty()),
        Err(PidError::WouldDeadlock)
    );
}

#[test]
fn test_non_parent_join_fails_even_after_exit() {
    let table = table_with_capacity(16);
    let parent = table.allocate(BOOT).unwrap();
    let sibling = table.allocate(parent).unwrap();
    let child = table.allocate(parent).unwrap();
    let grandchild = table.allocate(child).unwrap();

    table.record_exit(grandchild, 4, false);

    for caller in [BOOT, parent, sibling] {
        assert_eq!(
            table.join(caller, grandchild, WaitOptions::empty()),
            Err(PidError::NotYourChild)
        );
    }
    assert_eq!(
        table.join(child, grandchild, WaitOptions::empty()),
        Ok(JoinOutcome::Exited {
            pid: grandchild,
            status: 4
        })
    );
}

#[test]
fn test_detach_after_exit_reclaims() {
    let table = table_with_capacity(16);
    let parent = table.allocate(BOOT).unwrap();
    let child = table.allocate(parent).unwrap();

    table.record_exit(child, 7, false);
    assert!(table.exists(child));
    assert_eq!(table.state(child), Some(PidState::Zombie));

    assert_eq!(table.detach(child), Ok(()));
    assert!(!table.exists(child));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_exit_after_detach_reclaims() {
    let table = table_with_capacity(16);
    let parent = table.allocate(BOOT).unwrap();
    let child = table.allocate(parent).unwrap();

    assert_eq!(table.detach(child), Ok(()));
    assert!(table.exists(child));

    table.record_exit(child, 0, false);
    assert!(!table.exists(child));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_exit_detaches_running_children() {
    let table = table_with_capacity(16);
    let parent = table.allocate(BOOT).unwrap();
    let first = table.allocate(parent).unwrap();
    let second = table.allocate(parent).unwrap();

    table.record_exit(parent, 0, true);

    assert!(!table.is_parent_of(first, parent));
    assert!(!table.is_parent_of(second, parent));
    assert_eq!(table.state(first), Some(PidState::Orphan));
    assert_eq!(table.state(second), Some(PidState::Orphan));

    // 孤儿退出后无需任何调用即被回收
    table.record_exit(first, 0, false);
    table.record_exit(second, 0, false);
    assert!(!table.exists(first));
    assert!(!table.exists(second));
}

#[test]
fn test_pid_reuse_after_reclaim() {
    let table = table_with_capacity(4);
    let a = table.allocate(BOOT).unwrap();
    let b = table.allocate(BOOT).unwrap();
    let c = table.allocate(BOOT).unwrap();
    assert_eq!(table.allocate(BOOT), Err(PidError::ResourceExhausted));

    table.record_exit(b, 0, false);
    table.detach(b).unwrap();

    let d = table.allocate(BOOT).unwrap();
    assert_ne!(d, a);
    assert_ne!(d, c);
    assert_eq!(d as usize % 4, b as usize % 4);
    assert!(table.exists(d));
    assert!(!table.exists(b));
}

#[test]
fn test_join_after_reclaim_reports_no_such_process() {
    let table = table_with_capacity(4);
    let parent = table.allocate(BOOT).unwrap();
    let child = table.allocate(parent).unwrap();

    table.record_exit(child, 11, false);
    table.detach(child).unwrap();

    assert_eq!(
        table.join(parent, child, WaitOptions::WNOHANG),
        Err(PidError::NoSuchProcess)
    );
}
