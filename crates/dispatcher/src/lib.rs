//! # Handshake Dispatcher
//!
//! 多方通知握手的核心：受理请求后并发通知每个参与者，每个通知都与截止时间竞速，
//! 全部出结果后按原始顺序汇总，再把汇总结果投递给请求方指定的回调地址。
//!
//! ```text
//! 请求 → 校验 → 受理应答 → 并发通知 N 个参与者 → 汇合 → 汇总 → 回调投递
//! ```
//!
//! 每个参与者的状态只迁移一次：`pending → completed | unresponsive`。
//! 单个参与者的失败或超时不会影响其他参与者，也不会中断汇合。

pub mod callback;
pub mod coordinator;
pub mod metrics;
pub mod notifier;
pub mod racer;
pub mod retry;

pub use callback::{CallbackSink, HttpCallbackSink};
pub use coordinator::{DispatchCoordinator, DispatchHandle};
pub use notifier::{HttpParticipantNotifier, ParticipantNotifier};
pub use racer::{race, race_detached, RaceOutcome, TimeoutRacer};
pub use retry::{CallbackRetryPolicy, DeliveryReport};
