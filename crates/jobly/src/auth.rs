//! Authentication and authorization helpers.
//!
//! Password hashing and token signing are supplied by the caller through
//! [`PasswordHasher`] and [`TokenSigner`]; this module only decides who may do
//! what.

use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::models::{NewUser, User};
use crate::value::{UpdateFields, Value};
use serde::{Deserialize, Serialize};

/// Reserved body field carrying the caller's token.
pub const TOKEN_FIELD: &str = "_token";

/// What a token asserts about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
}

/// One-way password hashing (bcrypt or similar).
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> JoblyResult<String>;

    /// `Ok(false)` for a wrong password; `Err` only when the hash itself is unusable.
    fn verify(&self, password: &str, hash: &str) -> JoblyResult<bool>;
}

/// Signs and verifies bearer tokens.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &Claims) -> JoblyResult<String>;

    /// Decode a token, failing with [`JoblyError::Unauthorized`] if it was not
    /// issued by this signer.
    fn verify(&self, token: &str) -> JoblyResult<Claims>;
}

/// Check a username/password pair and issue a token for it.
pub async fn login(
    conn: &impl GenericClient,
    username: &str,
    password: &str,
    hasher: &impl PasswordHasher,
    signer: &impl TokenSigner,
) -> JoblyResult<String> {
    match User::authenticate(conn, username, password, hasher).await? {
        Some(claims) => {
            tracing::debug!(target: "jobly.auth", username, "login succeeded");
            signer.sign(&claims)
        }
        None => {
            tracing::debug!(target: "jobly.auth", username, "login rejected");
            Err(JoblyError::unauthorized("Invalid username/password"))
        }
    }
}

/// Create a user and issue a token for the new account.
pub async fn register(
    conn: &impl GenericClient,
    new: &NewUser,
    hasher: &impl PasswordHasher,
    signer: &impl TokenSigner,
) -> JoblyResult<String> {
    let user = User::create(conn, new, hasher).await?;
    tracing::debug!(target: "jobly.auth", username = %user.username, "user registered");
    signer.sign(&Claims {
        username: user.username,
        is_admin: user.is_admin,
    })
}

/// The `_token` field of a request body, if it is a string.
pub fn token_from_fields(fields: &UpdateFields) -> Option<&str> {
    fields.reserved(TOKEN_FIELD).and_then(Value::as_str)
}

/// Any valid token.
pub fn ensure_logged_in(signer: &impl TokenSigner, token: Option<&str>) -> JoblyResult<Claims> {
    let token = token.ok_or_else(|| JoblyError::unauthorized("You must authenticate first."))?;
    signer
        .verify(token)
        .map_err(|_| JoblyError::unauthorized("You must authenticate first."))
}

/// A valid token whose bearer is an admin.
pub fn ensure_admin(signer: &impl TokenSigner, token: Option<&str>) -> JoblyResult<Claims> {
    let claims = ensure_logged_in(signer, token)?;
    if claims.is_admin {
        Ok(claims)
    } else {
        Err(JoblyError::unauthorized("You must be an admin to access."))
    }
}

/// A valid token whose bearer is `username`.
pub fn ensure_correct_user(
    signer: &impl TokenSigner,
    token: Option<&str>,
    username: &str,
) -> JoblyResult<Claims> {
    let claims = ensure_logged_in(signer, token)?;
    if claims.username == username {
        Ok(claims)
    } else {
        Err(JoblyError::unauthorized("Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tokens look like `signed:<username>:<is_admin>`.
    struct FakeSigner;

    impl TokenSigner for FakeSigner {
        fn sign(&self, claims: &Claims) -> JoblyResult<String> {
            Ok(format!("signed:{}:{}", claims.username, claims.is_admin))
        }

        fn verify(&self, token: &str) -> JoblyResult<Claims> {
            let rest = token
                .strip_prefix("signed:")
                .ok_or_else(|| JoblyError::unauthorized("bad signature"))?;
            let (username, is_admin) = rest
                .rsplit_once(':')
                .ok_or_else(|| JoblyError::unauthorized("malformed token"))?;
            Ok(Claims {
                username: username.to_string(),
                is_admin: is_admin == "true",
            })
        }
    }

    fn token(username: &str, is_admin: bool) -> String {
        FakeSigner
            .sign(&Claims {
                username: username.to_string(),
                is_admin,
            })
            .unwrap()
    }

    #[test]
    fn token_is_read_from_reserved_field() {
        let body = UpdateFields::new().with("first_name", "Jo").with("_token", "abc");
        assert_eq!(token_from_fields(&body), Some("abc"));
        assert_eq!(token_from_fields(&UpdateFields::new()), None);
        assert_eq!(
            token_from_fields(&UpdateFields::new().with("_token", 1)),
            None
        );
    }

    #[test]
    fn logged_in_requires_a_verifiable_token() {
        let claims = ensure_logged_in(&FakeSigner, Some(token("u1", false).as_str())).unwrap();
        assert_eq!(claims.username, "u1");

        let err = ensure_logged_in(&FakeSigner, None).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(ensure_logged_in(&FakeSigner, Some("forged:u1:true")).is_err());
    }

    #[test]
    fn admin_check() {
        assert!(ensure_admin(&FakeSigner, Some(token("boss", true).as_str())).is_ok());
        let err = ensure_admin(&FakeSigner, Some(token("u1", false).as_str())).unwrap_err();
        assert!(matches!(err, JoblyError::Unauthorized(_)));
    }

    #[test]
    fn correct_user_check() {
        let t = token("u1", false);
        assert!(ensure_correct_user(&FakeSigner, Some(t.as_str()), "u1").is_ok());
        assert!(ensure_correct_user(&FakeSigner, Some(t.as_str()), "u2").is_err());
        // Being an admin does not make you someone else.
        let admin = token("boss", true);
        assert!(ensure_correct_user(&FakeSigner, Some(admin.as_str()), "u1").is_err());
    }

    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> JoblyResult<String> {
            Ok(password.to_string())
        }

        fn verify(&self, password: &str, hash: &str) -> JoblyResult<bool> {
            Ok(password == hash)
        }
    }

    #[tokio::test]
    async fn login_for_unknown_user_is_unauthorized() {
        let conn = crate::test_support::RecordingClient::new();
        let err = login(&conn, "ghost", "pw", &PlainHasher, &FakeSigner)
            .await
            .unwrap_err();
        assert!(matches!(err, JoblyError::Unauthorized(_)));
        assert_eq!(err.to_string(), "Unauthorized: Invalid username/password");
    }

    #[tokio::test]
    async fn register_hashes_before_inserting() {
        let conn = crate::test_support::RecordingClient::new();
        let new = NewUser {
            username: "jo".into(),
            password: "hunter2".into(),
            first_name: "Jo".into(),
            last_name: "March".into(),
            email: "jo@example.com".into(),
            photo_url: None,
        };
        // The recording client returns no row, so the insert reports NotFound
        // and no token is signed.
        let err = register(&conn, &new, &ReversingHasher, &FakeSigner)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let seen = conn.recorded();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].tag.as_deref(), Some("users.create"));
        assert_eq!(seen[0].params[1], format!("{:?}", Value::from("2retnuh")));
    }

    struct ReversingHasher;

    impl PasswordHasher for ReversingHasher {
        fn hash(&self, password: &str) -> JoblyResult<String> {
            Ok(password.chars().rev().collect())
        }

        fn verify(&self, password: &str, hash: &str) -> JoblyResult<bool> {
            Ok(password.chars().rev().eq(hash.chars()))
        }
    }

    #[test]
    fn claims_serialize_as_object() {
        let claims = Claims {
            username: "u1".into(),
            is_admin: false,
        };
        assert_eq!(
            serde_json::to_string(&claims).unwrap(),
            r#"{"username":"u1","is_admin":false}"#
        );
    }
}
