use axum::http::{HeaderMap, HeaderValue, header};
use uuid::Uuid;

/// Cookie carrying the browser-session identifier that scopes loop-guard flags.
pub const SESSION_COOKIE: &str = "nq_session";

/// Browser session attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque identifier.
    pub id: String,
    /// Minted for this request; the response must set the cookie.
    pub is_new: bool,
}

impl Session {
    /// Reuse the session cookie when it holds a valid id, otherwise start a new session.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match session_cookie(headers) {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: Uuid::new_v4().to_string(),
                is_new: true,
            },
        }
    }

    /// `Set-Cookie` value for a new session; `None` when the browser already has it.
    ///
    /// No `Max-Age` so the cookie ends with the browser session.
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.is_new {
            return None;
        }
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.id
        ))
        .ok()
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}
