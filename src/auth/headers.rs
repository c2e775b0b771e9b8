use axum::http::HeaderMap;

/// Headers forwarded from the incoming request to the auth service.
const FORWARDED: &[&str] = &[
    "cookie",
    "authorization",
    "user-agent",
    "x-forwarded-for",
    "x-real-ip",
    "origin",
    "x-api-key",
];

/// Ambient request headers attached to every auth-service call.
///
/// Names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the forwardable subset of `headers`; non-UTF-8 values are dropped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let entries = FORWARDED
            .iter()
            .filter_map(|name| {
                headers
                    .get(*name)
                    .and_then(|value| value.to_str().ok())
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with("authorization", format!("Bearer {token}"))
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.get("authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
