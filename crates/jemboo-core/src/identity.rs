//! Session identity sent with every backend call.

use serde::{Deserialize, Serialize};

/// Who a session belongs to and which locale it speaks.
///
/// `user_id` is absent for anonymous visitors; backends receive it only when
/// present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Authenticated user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Embedding application.
    pub application_id: String,
    /// Client-side session.
    pub session_id: String,
    /// Locale tag (e.g. `en`, `de-DE`).
    pub locale: String,
}

impl Identity {
    /// Query parameters identifying this session to a backend.
    ///
    /// `user_id` is appended last and only when present.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("application_id", self.application_id.as_str()),
            ("session_id", self.session_id.as_str()),
            ("locale", self.locale.as_str()),
        ];
        if let Some(user_id) = self.user_id.as_deref() {
            pairs.push(("user_id", user_id));
        }
        pairs
    }

    /// Same as [`query_pairs`](Self::query_pairs) without the locale.
    pub fn query_pairs_without_locale(&self) -> Vec<(&'static str, &str)> {
        self.query_pairs()
            .into_iter()
            .filter(|(k, _)| *k != "locale")
            .collect()
    }
}
