use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{claims::Claims, roles::Role},
    config::JwtConfig,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// HS256 signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str, role: &Role) -> Result<String, TokenError> {
        self.issue_at(user_id, email, role, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        role: &Role,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role_id: role.id,
            role_name: role.name.clone(),
            permissions: role.permissions.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id = %user_id, role = %role.name, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Checks signature, algorithm, issuer and audience, then expiry against `now`.
    /// Expiry is exact: a token is valid in `[iat, exp)` with no leeway.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::Invalid
        })?;

        if now.unix_timestamp() >= data.claims.exp {
            debug!(user_id = %data.claims.sub, "jwt expired");
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 24 * 60,
        })
    }

    fn user_role() -> Role {
        Role {
            id: 2,
            name: "user".into(),
            description: String::new(),
            permissions: vec!["read".into()],
        }
    }

    #[test]
    fn issue_and_verify_immediately() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "u1@example.com", &user_role()).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role_name, "user");
        assert_eq!(claims.role_id, 2);
        assert_eq!(claims.permissions, vec!["read".to_string()]);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn token_has_three_segments() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(Uuid::new_v4(), "a@b.co", &user_role()).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn valid_until_the_last_second_then_expired() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let t = datetime!(2026-01-01 12:00 UTC);
        let token = keys.issue_at(Uuid::new_v4(), "u1@example.com", &user_role(), t).unwrap();

        assert!(keys.verify_at(&token, t).is_ok());
        assert!(keys.verify_at(&token, t + Duration::hours(12)).is_ok());
        assert!(keys
            .verify_at(&token, t + Duration::hours(24) - Duration::seconds(1))
            .is_ok());

        let err = keys.verify_at(&token, t + Duration::hours(24)).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
        let err = keys.verify_at(&token, t + Duration::days(30)).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn tampering_with_any_byte_fails_closed() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(Uuid::new_v4(), "a@b.co", &user_role()).unwrap();
        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'z' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(
                keys.verify(&tampered).is_err(),
                "tampered byte {i} was accepted"
            );
        }
    }

    #[test]
    fn rejects_other_secret_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let token = good.issue(Uuid::new_v4(), "a@b.co", &user_role()).unwrap();

        for other in [
            make_keys("other-secret", "good-iss", "good-aud"),
            make_keys("same-secret", "bad-iss", "good-aud"),
            make_keys("same-secret", "good-iss", "bad-aud"),
        ] {
            assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
        }
    }

    #[test]
    fn rejects_unsupported_algorithm() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.co".into(),
            role_id: 1,
            role_name: "admin".into(),
            permissions: vec![],
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(1)).unix_timestamp(),
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn rejects_garbage() {
        let keys = make_keys("dev-secret", "iss", "aud");
        for token in ["", "abc", "a.b.c", "..."] {
            assert!(matches!(keys.verify(token), Err(TokenError::Invalid)));
        }
    }
}
