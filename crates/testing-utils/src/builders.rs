//! Test data builders for dispatch requests

use handshake_domain::{DispatchPayload, DispatchRequest, PlayerPayload};

/// Builder for inbound dispatch payloads.
///
/// Defaults to `game_id = "g1"`, `callback_url = "https://orch"`, `secret = "s"`
/// and no players.
pub struct DispatchPayloadBuilder {
    payload: DispatchPayload,
}

impl DispatchPayloadBuilder {
    pub fn new() -> Self {
        Self {
            payload: DispatchPayload {
                players: Some(Vec::new()),
                game_id: Some("g1".to_string()),
                callback_url: Some("https://orch".to_string()),
                secret: Some("s".to_string()),
            },
        }
    }

    pub fn with_player(mut self, server_url: &str, username: &str) -> Self {
        self.payload
            .players
            .get_or_insert_with(Vec::new)
            .push(PlayerPayload {
                server_url: server_url.to_string(),
                username: username.to_string(),
            });
        self
    }

    pub fn with_game_id(mut self, game_id: &str) -> Self {
        self.payload.game_id = Some(game_id.to_string());
        self
    }

    pub fn with_callback_url(mut self, callback_url: &str) -> Self {
        self.payload.callback_url = Some(callback_url.to_string());
        self
    }

    pub fn with_secret(mut self, secret: Option<&str>) -> Self {
        self.payload.secret = secret.map(str::to_string);
        self
    }

    pub fn without_players(mut self) -> Self {
        self.payload.players = None;
        self
    }

    pub fn without_game_id(mut self) -> Self {
        self.payload.game_id = None;
        self
    }

    pub fn without_callback_url(mut self) -> Self {
        self.payload.callback_url = None;
        self
    }

    pub fn build(self) -> DispatchPayload {
        self.payload
    }

    /// Panics if the payload does not validate.
    pub fn build_request(self) -> DispatchRequest {
        self.payload
            .validate()
            .expect("builder produced an invalid dispatch payload")
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.payload).expect("dispatch payload is always serializable")
    }
}

impl Default for DispatchPayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
