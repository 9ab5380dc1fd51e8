//! 上传接入控制：按客户端标识的滑动窗口限流。

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// 接入控制能力接口。
///
/// 单实例部署使用进程内实现；多实例部署可换成共享计数存储。
pub trait AdmissionLimiter: Send + Sync {
    /// 判断该客户端当前是否允许再接受一次请求。
    fn check(&self, client_id: &str) -> bool;
}

/// 进程内滑动窗口限流器。
///
/// 每个客户端保存窗口内被接受请求的毫秒时间戳，检查时惰性剪除过期项。
/// 被拒绝的请求不占用窗口配额。
pub struct MemoryLimiter {
    windows: Mutex<HashMap<String, Vec<u64>>>,
    limit: usize,
    window_ms: u64,
}

impl MemoryLimiter {
    pub fn new(limit: usize, window_ms: u64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            window_ms,
        }
    }

    /// 在指定时间点执行检查，便于测试注入时钟。
    fn check_at(&self, client_id: &str, now_ms: u64) -> bool {
        let mut windows = lock_windows(&self.windows);
        let cutoff = now_ms.saturating_sub(self.window_ms);
        let stamps = windows.entry(client_id.to_string()).or_default();
        stamps.retain(|&stamp| stamp >= cutoff);

        if stamps.len() >= self.limit {
            return false;
        }

        stamps.push(now_ms);
        true
    }

    /// 清理窗口已完全排空的客户端，避免键无限增长。
    pub fn sweep(&self) {
        let now_ms = now_millis();
        let mut windows = lock_windows(&self.windows);
        let cutoff = now_ms.saturating_sub(self.window_ms);
        windows.retain(|_, stamps| {
            stamps.retain(|&stamp| stamp >= cutoff);
            !stamps.is_empty()
        });
    }

    /// 当前跟踪的客户端数量。
    pub fn tracked_clients(&self) -> usize {
        lock_windows(&self.windows).len()
    }
}

impl AdmissionLimiter for MemoryLimiter {
    fn check(&self, client_id: &str) -> bool {
        self.check_at(client_id, now_millis())
    }
}

fn lock_windows(
    windows: &Mutex<HashMap<String, Vec<u64>>>,
) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u64>>> {
    match windows.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::{AdmissionLimiter, MemoryLimiter};

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let limiter = MemoryLimiter::new(15, 60_000);
        for n in 0..15 {
            assert!(limiter.check_at("client", 1_000 + n), "request {n} rejected");
        }
        assert!(!limiter.check_at("client", 1_020));
    }

    #[test]
    fn window_slides_instead_of_resetting() {
        let limiter = MemoryLimiter::new(2, 60_000);
        assert!(limiter.check_at("client", 0));
        assert!(limiter.check_at("client", 30_000));
        // Still two stamps inside the trailing window.
        assert!(!limiter.check_at("client", 59_999));
        // First stamp expired, second has not.
        assert!(limiter.check_at("client", 60_001));
        assert!(!limiter.check_at("client", 60_002));
    }

    #[test]
    fn rejected_attempt_consumes_no_slot() {
        let limiter = MemoryLimiter::new(1, 60_000);
        assert!(limiter.check_at("client", 100));
        assert!(!limiter.check_at("client", 200));
        // Had the rejection at t=200 been recorded, this would still be blocked.
        assert!(limiter.check_at("client", 60_150));
    }

    #[test]
    fn clients_are_limited_independently() {
        let limiter = MemoryLimiter::new(1, 60_000);
        assert!(limiter.check_at("alice", 0));
        assert!(limiter.check_at("bob", 0));
        assert!(!limiter.check_at("alice", 1));
    }

    #[test]
    fn sweep_drops_drained_clients() {
        let limiter = MemoryLimiter::new(5, 1);
        assert!(limiter.check_at("old", 0));
        assert_eq!(limiter.tracked_clients(), 1);
        // Window is 1ms, so by real wall-clock time the entry is long gone.
        limiter.sweep();
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn trait_object_dispatch_works() {
        let limiter: Box<dyn AdmissionLimiter> = Box::new(MemoryLimiter::new(1, 60_000));
        assert!(limiter.check("client"));
        assert!(!limiter.check("client"));
    }
}
