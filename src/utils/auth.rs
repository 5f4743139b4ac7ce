use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub jti: String,
}

/// Issue a signed admin token. Each successful login mints its own token
/// with a fresh `jti` and expiry; nothing is stored server-side.
pub fn create_admin_token(secret: &str, ttl_hours: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: "admin".to_owned(),
        role: "admin".to_owned(),
        exp: expiration as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn validate_admin_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    if token_data.claims.role != "admin" {
        anyhow::bail!("token does not carry the admin role");
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cycle() {
        let secret = "test_secret";
        let token = create_admin_token(secret, 24).unwrap();
        let claims = validate_admin_token(&token, secret).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_admin_token("secret_a", 24).unwrap();
        assert!(validate_admin_token(&token, "secret_b").is_err());
    }

    #[test]
    fn test_tokens_are_unique_per_login() {
        let secret = "test_secret";
        let a = create_admin_token(secret, 24).unwrap();
        let b = create_admin_token(secret, 24).unwrap();
        assert_ne!(a, b);
    }
}
