//! Destination specific renderings of an [`Alert`].

use serde::Serialize;

use crate::core::Alert;
use crate::core::HeuristicType;
use crate::core::Network;
use crate::core::PathId;
use crate::core::SessionId;
use crate::core::Severity;

/// Markdown body for chat-ops webhooks
pub fn slack_message(alert: &Alert) -> String {
    format!(
        "{} *{} triggered*\n\nNetwork: {}\nSeverity: {}\nSession: {}\n\n*Assessment Content:*\n```{}```\n\n*Message:*\n{}",
        severity_symbol(alert.severity),
        alert.heuristic,
        alert.network,
        alert.severity,
        alert.session_id,
        alert.content,
        alert.message,
    )
}

/// One line summary; PagerDuty truncates anything past 1024 chars
pub fn pagerduty_summary(alert: &Alert) -> String {
    let summary = format!(
        "[{}] {} on {}: {} ({})",
        alert.severity, alert.heuristic, alert.network, alert.message, alert.content
    );
    truncate(summary, 1024)
}

/// Envelope published to queue destinations
#[derive(Debug, Serialize)]
pub struct QueueEnvelope<'a> {
    pub network: Network,
    pub heuristic_type: HeuristicType,
    pub severity: Severity,
    pub path_id: &'a PathId,
    pub session_id: &'a SessionId,
    pub timestamp: i64,
    pub message: &'a str,
    pub content: &'a str,
}

pub fn queue_envelope(alert: &Alert) -> QueueEnvelope<'_> {
    QueueEnvelope {
        network: alert.network,
        heuristic_type: alert.heuristic,
        severity: alert.severity,
        path_id: &alert.path_id,
        session_id: &alert.session_id,
        timestamp: alert.timestamp.timestamp(),
        message: &alert.message,
        content: &alert.content,
    }
}

fn severity_symbol(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => ":large_yellow_circle:",
        Severity::Medium => ":large_orange_circle:",
        Severity::High => ":red_circle:",
    }
}

fn truncate(
    mut s: String,
    max: usize,
) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}
