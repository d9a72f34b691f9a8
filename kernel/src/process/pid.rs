//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! PID 管理
//!
//! 进程表负责分配 PID、记录父子关系和退出状态，并让父进程等待子进程退出。
//!
//! 进程表是一个简单的哈希表：按 `pid % capacity` 索引，每个槽位只放一个进程。
//! 分配新 PID 时如果对应槽位已被占用，就跳过这个 PID，不做探测。
//!
//! 整张表由一把自旋锁保护，每个进程记录带一个条件变量，用于退出通知。
//!
//! 进程记录的生命周期：
//! ```text
//!   Live ──exit──▶ Zombie
//!    │               │
//!  detach          detach
//!    ▼               ▼
//!  Orphan ──exit──▶ Collectible (立即回收)
//! ```

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, trace, warn};
use spin::Mutex;

use super::wait::{JoinOutcome, WaitOptions};
use crate::config;
use crate::sync::ConditionVariable;

/// 进程 ID
pub type Pid = u32;

/// 无效 PID，不会被分配
pub const INVALID_PID: Pid = 0;

/// unallocate() 写入的退出状态，便于在调试输出中识别
const UNALLOC_STATUS: i32 = 0xdead;

/// 分配时扫描次数的额外余量
const SCAN_SLACK: usize = 5;

/// 进程表错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidError {
    /// 进程表已满
    ResourceExhausted,
    /// 无法为进程记录分配内存
    OutOfMemory,
    /// 目标进程不存在
    NoSuchProcess,
    /// 目标不可等待或不可分离，或参数非法
    InvalidArgument,
    /// 等待自己
    WouldDeadlock,
    /// 调用者不是目标的父进程
    NotYourChild,
}

impl fmt::Display for PidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PidError::ResourceExhausted => "process table full",
            PidError::OutOfMemory => "out of memory for process record",
            PidError::NoSuchProcess => "no such process",
            PidError::InvalidArgument => "invalid argument",
            PidError::WouldDeadlock => "process cannot wait for itself",
            PidError::NotYourChild => "not a child of the caller",
        };
        f.write_str(msg)
    }
}

/// 进程记录状态
///
/// 由“是否已退出”和“是否仍有父进程”两个标志计算得出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidState {
    /// 运行中，父进程可等待
    Live,
    /// 已退出，等待父进程读取退出状态
    Zombie,
    /// 运行中，已与父进程分离
    Orphan,
    /// 已退出且已分离，可以回收
    Collectible,
}

/// 进程表配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidTableConfig {
    /// 槽位数
    pub capacity: usize,
    /// 最小可分配 PID
    pub pid_min: Pid,
    /// 最大可分配 PID
    pub pid_max: Pid,
    /// 启动进程 PID
    pub bootup_pid: Pid,
}

impl Default for PidTableConfig {
    fn default() -> Self {
        Self {
            capacity: config::PROCS_MAX,
            pid_min: config::PID_MIN,
            pid_max: config::PID_MAX,
            bootup_pid: config::BOOTUP_PID,
        }
    }
}

impl PidTableConfig {
    /// 检查配置是否可用
    ///
    /// PID 范围必须覆盖所有槽位，否则表未满时分配也可能找不到空槽
    pub fn validate(&self) -> Result<(), PidError> {
        if self.capacity == 0 || self.pid_min == INVALID_PID || self.pid_max < self.pid_min {
            return Err(PidError::InvalidArgument);
        }
        let range = (self.pid_max - self.pid_min) as usize + 1;
        if range < self.capacity {
            return Err(PidError::InvalidArgument);
        }
        if self.bootup_pid == INVALID_PID
            || (self.pid_min..=self.pid_max).contains(&self.bootup_pid)
        {
            return Err(PidError::InvalidArgument);
        }
        Ok(())
    }
}

/// 单个进程的 PID 与退出信息
struct PidInfo {
    /// 本进程 PID
    pid: Pid,
    /// 父进程 PID，`None` 表示父进程不会再等待
    ppid: Option<Pid>,
    /// 退出状态，`None` 表示尚未退出
    exit_status: Option<i32>,
    /// 退出通知
    cv: Arc<ConditionVariable>,
}

impl PidInfo {
    fn new(pid: Pid, ppid: Option<Pid>) -> Self {
        debug_assert_ne!(pid, INVALID_PID);
        Self {
            pid,
            ppid,
            exit_status: None,
            cv: Arc::new(ConditionVariable::new()),
        }
    }

    fn state(&self) -> PidState {
        match (self.exit_status.is_some(), self.ppid.is_some()) {
            (false, true) => PidState::Live,
            (true, true) => PidState::Zombie,
            (false, false) => PidState::Orphan,
            (true, false) => PidState::Collectible,
        }
    }
}

/// 受表锁保护的数据
///
/// 这里的方法都要求调用者已持有表锁
struct PidTableInner {
    config: PidTableConfig,
    /// 槽位，按需增长，最多 `config.capacity` 个
    slots: Vec<Option<PidInfo>>,
    /// 下一个候选 PID
    next_pid: Pid,
    /// 已占用的槽位数
    nprocs: usize,
}

impl PidTableInner {
    #[inline]
    fn slot_index(&self, pid: Pid) -> usize {
        pid as usize % self.config.capacity
    }

    fn is_slot_free(&self, pid: Pid) -> bool {
        !matches!(self.slots.get(self.slot_index(pid)), Some(Some(_)))
    }

    fn get(&self, pid: Pid) -> Option<&PidInfo> {
        match self.slots.get(self.slot_index(pid)) {
            Some(Some(info)) if info.pid == pid => Some(info),
            _ => None,
        }
    }

    fn get_mut(&mut self, pid: Pid) -> Option<&mut PidInfo> {
        let index = self.slot_index(pid);
        match self.slots.get_mut(index) {
            Some(Some(info)) if info.pid == pid => Some(info),
            _ => None,
        }
    }

    /// 将新记录放入空槽位
    ///
    /// 槽位数组增长失败时返回 `OutOfMemory`，表保持不变
    fn put(&mut self, info: PidInfo) -> Result<(), PidError> {
        let index = self.slot_index(info.pid);

        if index >= self.slots.len() {
            let additional = index + 1 - self.slots.len();
            self.slots
                .try_reserve(additional)
                .map_err(|_| PidError::OutOfMemory)?;
            self.slots.resize_with(index + 1, || None);
        }

        assert!(
            self.slots[index].is_none(),
            "pid: slot {} already occupied when inserting pid {}",
            index,
            info.pid
        );
        self.slots[index] = Some(info);
        self.nprocs += 1;
        Ok(())
    }

    /// 从表中移除并释放一个已退出且已分离的记录
    fn remove(&mut self, pid: Pid) {
        let index = self.slot_index(pid);
        let info = match self.slots.get_mut(index).and_then(Option::take) {
            Some(info) => info,
            None => panic!("pid: removing pid {} from empty slot {}", pid, index),
        };

        assert_eq!(info.pid, pid, "pid: slot {} holds pid {}", index, info.pid);
        assert_eq!(
            info.state(),
            PidState::Collectible,
            "pid: removing pid {} that is not collectible",
            pid
        );

        self.nprocs -= 1;
        debug!("pid: released pid {} (status {:?})", pid, info.exit_status);
    }

    /// 在修改记录后调用，记录进入 Collectible 状态时立即回收
    fn settle(&mut self, pid: Pid) {
        if pid == self.config.bootup_pid {
            return;
        }
        if let Some(PidState::Collectible) = self.get(pid).map(PidInfo::state) {
            self.remove(pid);
        }
    }

    fn inc_next_pid(&mut self) {
        self.next_pid = if self.next_pid >= self.config.pid_max {
            self.config.pid_min
        } else {
            self.next_pid + 1
        };
    }

    fn children_of(&self, ppid: Pid) -> Vec<Pid> {
        self.slots
            .iter()
            .flatten()
            .filter(|info| info.ppid == Some(ppid))
            .map(|info| info.pid)
            .collect()
    }

    fn detach(&mut self, pid: Pid) -> Result<(), PidError> {
        let bootup_pid = self.config.bootup_pid;
        let info = self.get_mut(pid).ok_or(PidError::NoSuchProcess)?;

        if info.pid == bootup_pid || info.ppid.is_none() {
            return Err(PidError::InvalidArgument);
        }

        info.ppid = None;
        // 正在等待它的线程需要重新检查
        info.cv.broadcast();
        debug!("pid: detached pid {} ({:?})", pid, info.state());

        self.settle(pid);
        Ok(())
    }

    #[inline]
    fn trace_table(&self, op: &str) {
        #[cfg(feature = "debug_log")]
        for info in self.slots.iter().flatten() {
            trace!(
                "pid: [{}] pid={} ppid={:?} state={:?}",
                op,
                info.pid,
                info.ppid,
                info.state()
            );
        }
        #[cfg(not(feature = "debug_log"))]
        let _ = op;
    }
}

/// 进程表
///
/// 所有操作都只获取一次表锁；只有阻塞的 join() 会在等待期间释放锁
pub struct PidTable {
    inner: Mutex<PidTableInner>,
}

impl PidTable {
    /// 创建进程表，并登记启动进程
    ///
    /// 启动进程没有父进程，不能被等待、分离或回收
    pub fn new(config: PidTableConfig) -> Result<Self, PidError> {
        config.validate()?;

        let mut inner = PidTableInner {
            config,
            slots: Vec::new(),
            next_pid: config.pid_min,
            nprocs: 0,
        };
        inner.put(PidInfo::new(config.bootup_pid, None))?;

        debug!(
            "pid: table ready, capacity={} range={}..={} bootup={}",
            config.capacity, config.pid_min, config.pid_max, config.bootup_pid
        );

        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// 使用 Kernel.toml 中的配置创建进程表
    pub fn bootstrap() -> Result<Self, PidError> {
        Self::new(PidTableConfig::default())
    }

    /// 为 `creator` 创建的新进程分配 PID
    ///
    /// 表满时直接返回 `ResourceExhausted`，不做扫描
    pub fn allocate(&self, creator: Pid) -> Result<Pid, PidError> {
        assert_ne!(creator, INVALID_PID, "pid: allocate from invalid creator");

        let mut inner = self.inner.lock();
        let capacity = inner.config.capacity;

        if inner.nprocs == capacity {
            debug!("pid: table full, creator {} refused", creator);
            return Err(PidError::ResourceExhausted);
        }

        // 上面的检查保证这里能找到空槽，除非 nprocs 计数出错
        let mut count = 0;
        while !inner.is_slot_free(inner.next_pid) {
            assert!(
                count < capacity * 2 + SCAN_SLACK,
                "pid: no free slot found but nprocs={} < capacity={}",
                inner.nprocs,
                capacity
            );
            count += 1;
            inner.inc_next_pid();
        }

        let pid = inner.next_pid;
        inner.put(PidInfo::new(pid, Some(creator)))?;
        inner.inc_next_pid();

        debug!("pid: allocated pid {} for parent {}", pid, creator);
        inner.trace_table("allocate");
        Ok(pid)
    }

    /// 撤销一个刚分配、尚未开始运行的 PID
    ///
    /// 只能在新任务启动失败时由创建者调用。任务一旦开始运行就必须走正常退出流程。
    pub fn unallocate(&self, pid: Pid, expected_parent: Pid) {
        let mut inner = self.inner.lock();
        let config = inner.config;

        assert!(
            (config.pid_min..=config.pid_max).contains(&pid),
            "pid: unallocate of out-of-range pid {}",
            pid
        );

        let info = match inner.get_mut(pid) {
            Some(info) => info,
            None => panic!("pid: unallocate of unknown pid {}", pid),
        };
        assert!(
            info.exit_status.is_none(),
            "pid: unallocate of exited pid {}",
            pid
        );
        assert_eq!(
            info.ppid,
            Some(expected_parent),
            "pid: unallocate of pid {} by non-parent {}",
            pid,
            expected_parent
        );

        info.exit_status = Some(UNALLOC_STATUS);
        info.ppid = None;
        inner.remove(pid);

        debug!("pid: unallocated pid {}", pid);
        inner.trace_table("unallocate");
    }

    /// 记录 `pid` 的退出状态并唤醒所有等待者
    ///
    /// `detach_children` 为真时先分离所有子进程，它们退出时会被立即回收。
    /// 已分离的进程退出后立即回收。
    pub fn record_exit(&self, pid: Pid, status: i32, detach_children: bool) {
        let mut inner = self.inner.lock();

        if inner.get(pid).is_none() {
            warn!("pid: exit of pid {} which has no record", pid);
            return;
        }

        if detach_children {
            for child in inner.children_of(pid) {
                // 子进程的 ppid 指向 pid，不会是启动进程
                if let Err(err) = inner.detach(child) {
                    panic!("pid: detaching child {} of {} failed: {}", child, pid, err);
                }
            }
        }

        if let Some(info) = inner.get_mut(pid) {
            assert!(
                info.exit_status.is_none(),
                "pid: pid {} exited twice",
                pid
            );
            info.exit_status = Some(status);
            info.cv.broadcast();
            debug!("pid: pid {} exited with status {} ({:?})", pid, status, info.state());
        }

        inner.settle(pid);
        inner.trace_table("exit");
    }

    /// 父进程放弃对 `pid` 退出状态的关注
    ///
    /// `pid` 已退出时立即回收，否则在它退出时回收
    pub fn detach(&self, pid: Pid) -> Result<(), PidError> {
        let mut inner = self.inner.lock();
        let result = inner.detach(pid);
        inner.trace_table("detach");
        result
    }

    /// 等待 `target` 退出并返回其退出状态
    ///
    /// 按顺序检查：
    /// 1. 目标不存在 -> `NoSuchProcess`
    /// 2. 目标是启动进程 -> `InvalidArgument`
    /// 3. 等待自己 -> `WouldDeadlock`
    /// 4. 目标已分离 -> `InvalidArgument`
    /// 5. 调用者不是目标的父进程 -> `NotYourChild`
    ///
    /// 目标未退出时，带 `WNOHANG` 返回 `JoinOutcome::NotReady`，否则阻塞等待，
    /// 每次被唤醒后重新检查。join 不回收记录，重复 join 得到相同的退出状态。
    pub fn join(
        &self,
        caller: Pid,
        target: Pid,
        options: WaitOptions,
    ) -> Result<JoinOutcome, PidError> {
        let mut inner = self.inner.lock();
        let bootup_pid = inner.config.bootup_pid;
        let mut waited_on: Option<Arc<ConditionVariable>> = None;

        loop {
            let info = inner.get(target).ok_or(PidError::NoSuchProcess)?;

            // 等待期间目标被回收，PID 又分配给了别的进程
            if let Some(cv) = &waited_on {
                if !Arc::ptr_eq(cv, &info.cv) {
                    return Err(PidError::NoSuchProcess);
                }
            }

            if info.pid == bootup_pid {
                return Err(PidError::InvalidArgument);
            }
            if caller == info.pid {
                return Err(PidError::WouldDeadlock);
            }
            match info.ppid {
                None => return Err(PidError::InvalidArgument),
                Some(ppid) if ppid != caller => return Err(PidError::NotYourChild),
                Some(_) => {}
            }

            if let Some(status) = info.exit_status {
                debug!("pid: {} joined {} with status {}", caller, target, status);
                return Ok(JoinOutcome::Exited {
                    pid: info.pid,
                    status,
                });
            }

            if options.is_nohang() {
                return Ok(JoinOutcome::NotReady);
            }

            let cv = Arc::clone(&info.cv);
            trace!("pid: {} waiting for {}", caller, target);
            inner = cv.wait(inner, &self.inner);
            trace!("pid: {} woke up waiting for {}", caller, target);
            waited_on = Some(cv);
        }
    }

    /// `candidate` 是否为 `child` 当前的父进程
    ///
    /// `child` 不存在时返回 false
    pub fn is_parent_of(&self, child: Pid, candidate: Pid) -> bool {
        let inner = self.inner.lock();
        inner
            .get(child)
            .map_or(false, |info| info.ppid == Some(candidate))
    }

    /// 表中是否有 `pid` 的记录
    pub fn exists(&self, pid: Pid) -> bool {
        self.inner.lock().get(pid).is_some()
    }

    /// `pid` 的记录状态
    pub fn state(&self, pid: Pid) -> Option<PidState> {
        self.inner.lock().get(pid).map(PidInfo::state)
    }

    /// `pid` 的父进程；外层 `None` 表示记录不存在
    pub fn parent_of(&self, pid: Pid) -> Option<Option<Pid>> {
        self.inner.lock().get(pid).map(|info| info.ppid)
    }

    /// 父进程为 `pid` 的所有进程
    pub fn children_of(&self, pid: Pid) -> Vec<Pid> {
        self.inner.lock().children_of(pid)
    }

    /// 已占用的槽位数（包括启动进程）
    pub fn len(&self) -> usize {
        self.inner.lock().nprocs
    }

    /// 表是否只剩启动进程
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// 槽位数
    pub fn capacity(&self) -> usize {
        self.inner.lock().config.capacity
    }

    /// 启动进程 PID
    pub fn bootup_pid(&self) -> Pid {
        self.inner.lock().config.bootup_pid
    }
}

impl fmt::Debug for PidTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PidTable")
            .field("config", &inner.config)
            .field("nprocs", &inner.nprocs)
            .field("next_pid", &inner.next_pid)
            .finish()
    }
}
