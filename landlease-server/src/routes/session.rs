//! Session cookie helpers

use tower_cookies::{Cookie, Cookies};

use crate::state::AppState;
use crate::store::{LandStore, Principal, SessionId, SessionStore, UserStore};

/// Principal behind the request's session cookie, if any.
///
/// A failing session store is treated as no session.
pub fn current_principal<U, L, S>(state: &AppState<U, L, S>, cookies: &Cookies) -> Option<Principal>
where
    U: UserStore,
    L: LandStore,
    S: SessionStore,
{
    let cookie = cookies.get(&state.session_cookie)?;
    let session_id = SessionId(cookie.value().to_string());
    match state.session_store.get(&session_id) {
        Ok(session) => session.map(|s| s.principal),
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed");
            None
        }
    }
}

/// Session token from the request cookie
pub fn session_id(cookies: &Cookies, cookie_name: &str) -> Option<SessionId> {
    cookies
        .get(cookie_name)
        .map(|c| SessionId(c.value().to_string()))
}

pub fn set_session_cookie(cookies: &Cookies, cookie_name: &str, session_id: &str) {
    let cookie = Cookie::build((cookie_name.to_string(), session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &Cookies, cookie_name: &str) {
    let cookie = Cookie::build((cookie_name.to_string(), ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
