use std::fmt;

use actix_web::{http::header::HeaderValue, HttpRequest};

pub const AUTH_COOKIE: &str = "authToken";

/// Bearer credential of the user on whose behalf the backend is called.
///
/// Passed explicitly to every client call; nothing reads it from ambient
/// state.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self {
                token: token.to_string(),
            })
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// Finds the caller's session: an `Authorization: Bearer` header first,
/// then the `authToken` cookie.
pub fn session_from_request(request: &HttpRequest) -> Option<Session> {
    bearer_token(request).or_else(|| {
        let cookie = request.cookie(AUTH_COOKIE)?;
        Session::new(cookie.value())
    })
}

fn bearer_token(request: &HttpRequest) -> Option<Session> {
    let authorization = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .map(HeaderValue::to_str)?
        .ok()?;
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Session::new(token)
}

#[cfg(test)]
mod tests {
    use actix_web::{cookie::Cookie, http::header, test::TestRequest};

    use super::*;

    #[test]
    fn bearer_header_is_preferred() {
        let request = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc123"))
            .cookie(Cookie::new(AUTH_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(session_from_request(&request).unwrap().token(), "abc123");
    }

    #[test]
    fn cookie_is_the_fallback() {
        let request = TestRequest::default()
            .cookie(Cookie::new(AUTH_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(session_from_request(&request).unwrap().token(), "from-cookie");
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        let basic = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(session_from_request(&basic), None);

        let blank = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer   "))
            .to_http_request();
        assert_eq!(session_from_request(&blank), None);

        assert_eq!(session_from_request(&TestRequest::default().to_http_request()), None);
    }

    #[test]
    fn debug_output_hides_the_token() {
        let session = Session::new("secret").unwrap();
        assert!(!format!("{session:?}").contains("secret"));
    }
}
