//! One-shot flash notices carried in a cookie between a redirect and the
//! next page render. The value is hex-encoded JSON to stay cookie-safe.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

const FLASH_COOKIE: &str = "queueease_flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            category: "info".to_string(),
            message: message.into(),
        }
    }
}

pub fn set(jar: CookieJar, notice: Flash) -> CookieJar {
    let encoded = hex::encode(serde_json::to_vec(&notice).unwrap_or_default());
    jar.add(
        Cookie::build((FLASH_COOKIE, encoded))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    )
}

/// Consume the pending notice, if any, removing its cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let notice = jar
        .get(FLASH_COOKIE)
        .and_then(|c| hex::decode(c.value()).ok())
        .and_then(|raw| serde_json::from_slice(&raw).ok());
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/").build());
    (jar, notice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_take_round_trips() {
        let jar = CookieJar::new();
        let jar = set(jar, Flash::success("Login successful!"));

        let (jar, notice) = take(jar);
        assert_eq!(notice, Some(Flash::success("Login successful!")));

        // Consumed: the cookie is gone on the next request.
        let (_jar, notice) = take(jar);
        assert_eq!(notice, None);
    }

    #[test]
    fn garbage_cookie_values_yield_no_notice() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "not-hex!"));
        let (_jar, notice) = take(jar);
        assert_eq!(notice, None);
    }
}
