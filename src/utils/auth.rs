use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{Duration, Utc};

use crate::models::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: UserRole, expiry_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiry_hours);

        Self {
            sub: user_id,
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

pub fn create_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(user_id, role, expiry_hours);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_subject_and_role() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, UserRole::Supplier, "s3cret", 1).unwrap();

        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Supplier);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(Uuid::new_v4(), UserRole::Vendor, "one", 1).unwrap();
        assert!(verify_token(&token, "two").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60s leeway
        let token = create_token(Uuid::new_v4(), UserRole::Vendor, "s3cret", -1).unwrap();
        let err = verify_token(&token, "s3cret").unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn password_hash_verifies() {
        // Minimum cost keeps the test fast
        let hash = hash_password("market123", 4).unwrap();
        assert_ne!(hash, "market123");
        assert!(verify_password("market123", &hash).unwrap());
        assert!(!verify_password("market124", &hash).unwrap());
    }
}
