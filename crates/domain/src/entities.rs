use serde::{Deserialize, Serialize};

/// 单个通知目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub endpoint: String,
    /// 原样回显到结果中，不要求唯一
    pub identity: String,
}

impl Participant {
    pub fn new(endpoint: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            identity: identity.into(),
        }
    }
}

/// 已通过校验的分发请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub work_id: String,
    pub callback_endpoint: String,
    /// 只转发给回调方，不会发给参与者
    pub secret: Option<String>,
    pub participants: Vec<Participant>,
}

impl DispatchRequest {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// 按完成回调的约定拼接投递地址: `{callback}{completion_path}/{work_id}/finish/`
    pub fn finish_url(&self, completion_path: &str) -> String {
        format!(
            "{}{}/{}/finish/",
            self.callback_endpoint.trim_end_matches('/'),
            completion_path.trim_end_matches('/'),
            self.work_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantState {
    Completed,
    Unresponsive,
}

impl ParticipantState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantState::Completed => "completed",
            ParticipantState::Unresponsive => "unresponsive",
        }
    }
}

impl std::fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantOutcome {
    pub identity: String,
    pub state: ParticipantState,
}

impl ParticipantOutcome {
    pub fn completed(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            state: ParticipantState::Completed,
        }
    }

    pub fn unresponsive(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            state: ParticipantState::Unresponsive,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == ParticipantState::Completed
    }
}

/// 投递给回调方的汇总结果，`outcomes` 与请求中的参与者一一对应且顺序一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult {
    pub work_id: String,
    pub outcomes: Vec<ParticipantOutcome>,
    pub secret: Option<String>,
}

impl AggregateResult {
    pub fn completed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn unresponsive_count(&self) -> usize {
        self.outcomes.len() - self.completed_count()
    }
}
