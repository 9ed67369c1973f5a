use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    role: String,
    exp: usize,
}

pub async fn get_user_id_from_token(token: String) -> Result<String, AppError> {
    let secret = std::env::var("SECRET_TOKEN")
        .map_err(|e| AppError::Unexpected(anyhow::anyhow!(e).context("SECRET_TOKEN Env must be set")))?;
    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| AppError::Authentication(anyhow::anyhow!(e).context("Failed to decode token")))?;

    Ok(token_data.claims.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint_token(user_id: &str, secret: &str) -> String {
        let claims = Claims {
            sub: "user@example.com".to_string(),
            user_id: user_id.to_string(),
            role: "user".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_user_id_from_token_roundtrip() {
        std::env::set_var("SECRET_TOKEN", "test-secret");
        let token = mint_token("user-42", "test-secret");
        let user_id = get_user_id_from_token(token).await.unwrap();
        assert_eq!(user_id, "user-42");
    }

    #[tokio::test]
    async fn test_get_user_id_from_token_rejects_bad_signature() {
        std::env::set_var("SECRET_TOKEN", "test-secret");
        let token = mint_token("user-42", "other-secret");
        let err = get_user_id_from_token(token).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }
}
