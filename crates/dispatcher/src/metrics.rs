use handshake_domain::ParticipantState;
use metrics::{counter, histogram};
use std::time::Duration;

pub const DISPATCHES_TOTAL: &str = "handshake_dispatches_total";
pub const DISPATCHES_REJECTED_TOTAL: &str = "handshake_dispatches_rejected_total";
pub const PARTICIPANT_OUTCOMES_TOTAL: &str = "handshake_participant_outcomes_total";
pub const CALLBACK_DELIVERIES_TOTAL: &str = "handshake_callback_deliveries_total";
pub const DISPATCH_DURATION_SECONDS: &str = "handshake_dispatch_duration_seconds";

pub fn record_dispatch_accepted() {
    counter!(DISPATCHES_TOTAL).increment(1);
}

pub fn record_dispatch_rejected() {
    counter!(DISPATCHES_REJECTED_TOTAL).increment(1);
}

pub fn record_participant_outcome(state: ParticipantState) {
    counter!(PARTICIPANT_OUTCOMES_TOTAL, "state" => state.as_str()).increment(1);
}

pub fn record_callback_delivery(delivered: bool) {
    let result = if delivered { "delivered" } else { "failed" };
    counter!(CALLBACK_DELIVERIES_TOTAL, "result" => result).increment(1);
}

pub fn record_dispatch_duration(elapsed: Duration) {
    histogram!(DISPATCH_DURATION_SECONDS).record(elapsed.as_secs_f64());
}
