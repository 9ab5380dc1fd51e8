//! 限流器空闲键清理的后台任务。

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::LIMITER_SWEEP_INTERVAL_SECS;
use crate::limit::MemoryLimiter;

/// 周期性剪除已排空窗口的客户端，防止限流状态无界增长。
pub fn spawn_background_tasks(limiter: Arc<MemoryLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(LIMITER_SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            limiter.sweep();
            debug!(
                tracked_clients = limiter.tracked_clients(),
                "limiter sweep complete"
            );
        }
    });
}
