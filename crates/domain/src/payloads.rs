//! HTTP 线格式
//!
//! 字段名沿用对局编排方已经在用的协议（`players` / `game_id` / `callback_url` 等），
//! 不要随意改名。

use handshake_errors::{HandshakeError, HandshakeResult};
use serde::{Deserialize, Serialize};

use crate::entities::{AggregateResult, DispatchRequest, Participant, ParticipantState};

/// 入站分发请求体。所有字段都可能缺失，由 [`DispatchPayload::validate`] 统一校验
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchPayload {
    pub players: Option<Vec<PlayerPayload>>,
    pub game_id: Option<String>,
    pub callback_url: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerPayload {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub username: String,
}

impl DispatchPayload {
    /// 校验必填字段并转换为 [`DispatchRequest`]
    ///
    /// 只检查 `players`、`game_id`、`callback_url` 是否存在且非空，
    /// 参与者内部字段不做校验。
    pub fn validate(self) -> HandshakeResult<DispatchRequest> {
        let mut missing = Vec::new();

        let players = self.players.filter(|p| !p.is_empty());
        if players.is_none() {
            missing.push("players");
        }
        let game_id = self.game_id.filter(|id| !id.is_empty());
        if game_id.is_none() {
            missing.push("game_id");
        }
        let callback_url = self.callback_url.filter(|url| !url.is_empty());
        if callback_url.is_none() {
            missing.push("callback_url");
        }

        match (players, game_id, callback_url) {
            (Some(players), Some(work_id), Some(callback_endpoint)) => Ok(DispatchRequest {
                work_id,
                callback_endpoint,
                secret: self.secret,
                participants: players
                    .into_iter()
                    .map(|p| Participant::new(p.server_url, p.username))
                    .collect(),
            }),
            _ => Err(HandshakeError::validation_error(format!(
                "缺少必填字段: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// 发给每个参与者的通知体，不包含 secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub game_id: String,
    pub url: String,
}

impl From<&DispatchRequest> for NotificationPayload {
    fn from(request: &DispatchRequest) -> Self {
        Self {
            game_id: request.work_id.clone(),
            url: request.callback_endpoint.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    #[serde(rename = "finished")]
    Finished,
    #[serde(rename = "dnf")]
    Dnf,
}

impl From<ParticipantState> for PlayerState {
    fn from(state: ParticipantState) -> Self {
        match state {
            ParticipantState::Completed => PlayerState::Finished,
            ParticipantState::Unresponsive => PlayerState::Dnf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub username: String,
    pub state: PlayerState,
}

/// 汇总回调体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishPayload {
    pub players: Vec<PlayerResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl From<&AggregateResult> for FinishPayload {
    fn from(result: &AggregateResult) -> Self {
        Self {
            players: result
                .outcomes
                .iter()
                .map(|o| PlayerResult {
                    username: o.identity.clone(),
                    state: o.state.into(),
                })
                .collect(),
            secret: result.secret.clone(),
        }
    }
}
