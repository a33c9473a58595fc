//! Access logging with sanitized, length-bounded fields.

const MAX_PATH_CHARS: usize = 200;
const MAX_USER_AGENT_CHARS: usize = 200;
const MAX_REASON_CHARS: usize = 100;

/// What the guard knows about an incoming request.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub credential: Option<&'a str>,
    pub ip: Option<std::net::IpAddr>,
    pub method: &'a str,
    pub path: &'a str,
    pub user_agent: Option<&'a str>,
}

impl AccessRequest<'_> {
    /// Caller IP as logged and used in caller ids; `"unknown"` when absent.
    #[must_use]
    pub fn ip_label(&self) -> String {
        self.ip.map_or_else(|| "unknown".to_string(), |ip| ip.to_string())
    }
}

/// Removes control characters and truncates to `max_chars` characters so
/// caller-controlled text cannot forge or flood log lines.
#[must_use]
pub fn sanitize_log_field(value: &str, max_chars: usize) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .take(max_chars)
        .collect()
}

pub(crate) fn log_access_granted(request: &AccessRequest<'_>, token_id: &str) {
    tracing::info!(
        ip = %request.ip_label(),
        method = request.method,
        path = %sanitize_log_field(request.path, MAX_PATH_CHARS),
        token_id,
        "access granted"
    );
}

pub(crate) fn log_access_denied(request: &AccessRequest<'_>, reason: &str) {
    let reason = if reason.is_empty() { "unknown" } else { reason };
    tracing::warn!(
        ip = %request.ip_label(),
        method = request.method,
        path = %sanitize_log_field(request.path, MAX_PATH_CHARS),
        user_agent = %sanitize_log_field(request.user_agent.unwrap_or("unknown"), MAX_USER_AGENT_CHARS),
        reason = %sanitize_log_field(reason, MAX_REASON_CHARS),
        "access denied"
    );
}
