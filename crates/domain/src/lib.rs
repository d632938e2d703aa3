//! 分发握手的领域模型。
//!
//! [`entities`] 描述协调器内部使用的类型，[`payloads`] 描述三个 HTTP 接口上的
//! JSON 线格式，两者之间的转换和入站校验都在本 crate 完成。

pub mod entities;
pub mod payloads;

pub use entities::{
    AggregateResult, DispatchRequest, Participant, ParticipantOutcome, ParticipantState,
};
pub use payloads::{
    DispatchPayload, FinishPayload, NotificationPayload, PlayerPayload, PlayerResult, PlayerState,
};
