use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use handshake_config::AppConfig;
use handshake_domain::{
    AggregateResult, DispatchPayload, DispatchRequest, FinishPayload, NotificationPayload,
    Participant, ParticipantOutcome,
};
use handshake_errors::{HandshakeError, HandshakeResult};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::callback::{CallbackSink, HttpCallbackSink};
use crate::metrics;
use crate::notifier::{HttpParticipantNotifier, ParticipantNotifier};
use crate::racer::{RaceOutcome, TimeoutRacer};
use crate::retry::CallbackRetryPolicy;

/// 分发协调器
///
/// 校验请求后立即返回，后台并发通知所有参与者，等待全部出结果后把汇总
/// 投递给回调方。克隆开销很小，所有克隆共享同一组依赖和进行中计数。
#[derive(Clone)]
pub struct DispatchCoordinator {
    notifier: Arc<dyn ParticipantNotifier>,
    callback_sink: Arc<dyn CallbackSink>,
    racer: TimeoutRacer,
    retry_policy: CallbackRetryPolicy,
    completion_path: String,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

/// 已受理的一次分发。丢弃句柄不会影响后台执行
#[derive(Debug)]
pub struct DispatchHandle {
    pub dispatch_id: Uuid,
    join_handle: JoinHandle<AggregateResult>,
}

impl DispatchHandle {
    /// 等待分发结束（回调已投递或已放弃）并返回汇总结果
    pub async fn wait(self) -> HandshakeResult<AggregateResult> {
        self.join_handle
            .await
            .map_err(|e| HandshakeError::Internal(format!("分发任务异常退出: {e}")))
    }
}

/// 进行中分发的计数守卫，析构时减一，归零时唤醒 `wait_idle`
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl DispatchCoordinator {
    pub fn new(
        config: &AppConfig,
        notifier: Arc<dyn ParticipantNotifier>,
        callback_sink: Arc<dyn CallbackSink>,
    ) -> Self {
        let racer = TimeoutRacer::new(config.dispatch.notify_timeout())
            .cancel_on_timeout(config.dispatch.cancel_on_timeout);

        Self {
            notifier,
            callback_sink,
            racer,
            retry_policy: CallbackRetryPolicy::from(&config.callback),
            completion_path: config.callback.completion_path.clone(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    /// 使用 reqwest 实现的通知器和回调投递器，两者共用一个带请求上限的客户端
    pub fn with_http(config: &AppConfig) -> HandshakeResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.dispatch.request_ceiling())
            .build()?;

        Ok(Self::new(
            config,
            Arc::new(HttpParticipantNotifier::with_client(http_client.clone())),
            Arc::new(HttpCallbackSink::with_client(http_client)),
        ))
    }

    pub fn with_retry_policy(mut self, retry_policy: CallbackRetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// 当前尚未完成的分发数量
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 等待所有进行中的分发结束
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// 受理一次分发请求
    ///
    /// 校验失败时直接返回错误，不产生任何副作用。校验通过后在后台启动分发并
    /// 立即返回，调用方的等待时间与参与者数量和响应速度无关。
    pub fn submit(&self, payload: DispatchPayload) -> HandshakeResult<DispatchHandle> {
        let request = payload.validate().inspect_err(|e| {
            metrics::record_dispatch_rejected();
            warn!("拒绝分发请求: {}", e);
        })?;

        Ok(self.spawn(request))
    }

    /// 在后台执行一个已校验的请求
    pub fn spawn(&self, request: DispatchRequest) -> DispatchHandle {
        let dispatch_id = Uuid::new_v4();
        metrics::record_dispatch_accepted();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
            idle: self.idle.clone(),
        };

        info!(
            %dispatch_id,
            game_id = %request.work_id,
            participants = request.participant_count(),
            "受理分发请求"
        );

        let coordinator = self.clone();
        let span = info_span!("dispatch", %dispatch_id, game_id = %request.work_id);
        let join_handle = tokio::spawn(
            async move {
                let _guard = guard;
                coordinator.run(request).await
            }
            .instrument(span),
        );

        DispatchHandle {
            dispatch_id,
            join_handle,
        }
    }

    /// 通知全部参与者、汇总并投递回调，返回构建出的汇总结果
    pub async fn run(&self, request: DispatchRequest) -> AggregateResult {
        let started = Instant::now();

        let outcomes = self.notify_all(&request).await;
        let result = AggregateResult {
            work_id: request.work_id.clone(),
            outcomes,
            secret: request.secret.clone(),
        };

        info!(
            completed = result.completed_count(),
            unresponsive = result.unresponsive_count(),
            "全部参与者已出结果"
        );

        let url = request.finish_url(&self.completion_path);
        let report = self
            .retry_policy
            .deliver(
                self.callback_sink.as_ref(),
                &url,
                &FinishPayload::from(&result),
            )
            .await;
        if !report.delivered {
            warn!(
                attempts = report.attempts,
                last_error = report.last_error.as_deref().unwrap_or_default(),
                "汇总结果未能送达 {}",
                url
            );
        }
        metrics::record_callback_delivery(report.delivered);
        metrics::record_dispatch_duration(started.elapsed());

        result
    }

    /// 并发通知所有参与者并等待全部结束
    ///
    /// 结果按请求中的参与者顺序排列，与完成先后无关。
    pub async fn notify_all(&self, request: &DispatchRequest) -> Vec<ParticipantOutcome> {
        let payload = NotificationPayload::from(request);

        let races = request
            .participants
            .iter()
            .map(|participant| self.notify_one(participant.clone(), payload.clone()));

        join_all(races).await
    }

    async fn notify_one(
        &self,
        participant: Participant,
        payload: NotificationPayload,
    ) -> ParticipantOutcome {
        let notifier = self.notifier.clone();
        let target = participant.clone();
        let outcome = self
            .racer
            .run(async move { notifier.notify(&target, &payload).await })
            .await;

        let result = match outcome {
            RaceOutcome::Resolved(Ok(())) => {
                debug!(username = %participant.identity, "参与者已完成");
                ParticipantOutcome::completed(&participant.identity)
            }
            RaceOutcome::Resolved(Err(e)) => {
                warn!(username = %participant.identity, reason = "error", "参与者未响应: {}", e);
                ParticipantOutcome::unresponsive(&participant.identity)
            }
            RaceOutcome::TimedOut => {
                warn!(
                    username = %participant.identity,
                    reason = "timeout",
                    "参与者在 {:?} 内未响应",
                    self.racer.deadline()
                );
                ParticipantOutcome::unresponsive(&participant.identity)
            }
        };

        metrics::record_participant_outcome(result.state);
        result
    }
}
