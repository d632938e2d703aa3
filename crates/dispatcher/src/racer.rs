//! 截止时间竞速
//!
//! 把一个异步操作和一个计时器放在一起跑，谁先完成就采用谁的结果。
//! 操作在截止时间之前返回错误也算"已完成"，由调用方决定如何映射。

use handshake_errors::{HandshakeError, HandshakeResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// 一次竞速的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    /// 操作在截止时间之前完成
    Resolved(T),
    /// 截止时间先到
    TimedOut,
}

impl<T> RaceOutcome<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, RaceOutcome::TimedOut)
    }
}

/// 在原地竞速，截止时间一到就丢弃操作的 future，进行中的 I/O 随之取消
pub async fn race<F>(deadline: Duration, operation: F) -> RaceOutcome<F::Output>
where
    F: Future,
{
    match timeout(deadline, operation).await {
        Ok(value) => RaceOutcome::Resolved(value),
        Err(_) => RaceOutcome::TimedOut,
    }
}

/// 把操作放到独立任务中执行，只对"等待"设置截止时间
///
/// 超时后任务继续运行直到自然结束，其结果不会被观察。任务 panic 时按内部错误返回。
pub async fn race_detached<F, T>(
    deadline: Duration,
    operation: F,
) -> RaceOutcome<HandshakeResult<T>>
where
    F: Future<Output = HandshakeResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);

    match timeout(deadline, handle).await {
        Ok(Ok(result)) => RaceOutcome::Resolved(result),
        Ok(Err(join_error)) => RaceOutcome::Resolved(Err(HandshakeError::Internal(format!(
            "竞速任务异常退出: {join_error}"
        )))),
        Err(_) => {
            debug!("截止时间 {:?} 已到，放弃等待后台任务", deadline);
            RaceOutcome::TimedOut
        }
    }
}

/// 持有截止时间和取消策略的竞速器，协调器对每个参与者各用一次
#[derive(Debug, Clone, Copy)]
pub struct TimeoutRacer {
    deadline: Duration,
    cancel_loser: bool,
}

impl TimeoutRacer {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            cancel_loser: false,
        }
    }

    /// 设置为 true 时，超时的操作会被直接丢弃
    pub fn cancel_on_timeout(mut self, cancel_loser: bool) -> Self {
        self.cancel_loser = cancel_loser;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub async fn run<F, T>(&self, operation: F) -> RaceOutcome<HandshakeResult<T>>
    where
        F: Future<Output = HandshakeResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        if self.cancel_loser {
            race(self.deadline, operation).await
        } else {
            race_detached(self.deadline, operation).await
        }
    }
}
