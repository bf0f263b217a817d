use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use agora_types::api::{AuthResponse, Claims};
use agora_types::models::Session;

pub const TOKEN_COOKIE: &str = "agora_token";
pub const ROLE_COOKIE: &str = "agora_role";

/// Derive the session from the request's cookies. Token absent means
/// anonymous; so does a token we cannot read.
pub fn session_from_jar(jar: &CookieJar) -> Option<Session> {
    let token = jar.get(TOKEN_COOKIE)?.value().to_string();
    decode_session(&token)
}

/// Decode the role claim (and the rest of the session) from the access
/// token. The client holds no signing secret, so the signature is not
/// validated here — the backend rejects forged tokens on every API call; the
/// claim is only used for coarse routing. A malformed or expired token
/// degrades to anonymous rather than erroring.
pub fn decode_session(token: &str) -> Option<Session> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    let claims = data.claims;

    Some(Session {
        user_id: claims.sub,
        username: claims.username,
        display_name: claims.display_name,
        role: claims.role,
        email_verified: claims.email_verified,
        access_token: token.to_string(),
    })
}

/// Set the session cookies after login/verification. The token cookie is
/// HttpOnly; the role marker exists so non-page consumers (scripts, proxies)
/// can branch without parsing the JWT.
pub fn set_session_cookies(jar: CookieJar, auth: &AuthResponse) -> CookieJar {
    let token = Cookie::build((TOKEN_COOKIE, auth.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .permanent()
        .build();
    let role = Cookie::build((ROLE_COOKIE, auth.role.to_string()))
        .path("/")
        .same_site(SameSite::Lax)
        .permanent()
        .build();
    jar.add(token).add(role)
}

/// Destroy the session (logout).
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((TOKEN_COOKIE, "")).path("/").build())
        .remove(Cookie::build((ROLE_COOKIE, "")).path("/").build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::models::Role;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    /// Token signed with a secret this client never sees; only the claims
    /// matter for session derivation.
    fn make_token(role: Role, exp: chrono::DateTime<chrono::Utc>) -> String {
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "ada".into(),
            display_name: "Ada".into(),
            role,
            email_verified: true,
            exp: exp.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"not-our-secret")).unwrap()
    }

    #[test]
    fn valid_token_yields_a_session() {
        let token = make_token(Role::Moderator, chrono::Utc::now() + chrono::Duration::days(30));
        let session = decode_session(&token).expect("session");
        assert_eq!(session.role, Role::Moderator);
        assert_eq!(session.username, "ada");
        assert_eq!(session.access_token, token);
    }

    #[test]
    fn malformed_token_degrades_to_anonymous() {
        assert!(decode_session("not-a-jwt").is_none());
        assert!(decode_session("").is_none());
        assert!(decode_session("a.b.c").is_none());
    }

    #[test]
    fn expired_token_degrades_to_anonymous() {
        let token = make_token(Role::Member, chrono::Utc::now() - chrono::Duration::days(1));
        assert!(decode_session(&token).is_none());
    }
}
