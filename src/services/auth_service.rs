use crate::{
    auth::{
        TokenBundle,
        jwt::{JwtKeys, encode_token, make_access_claims},
        password::{hash_password, verify_password},
    },
    db::entities::user,
    error::AppError,
    services::user_service::{UserService, normalize_email},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Clone)]
pub struct AuthService<'a> {
    users: UserService,
    jwt: &'a JwtKeys,
    access_ttl_secs: usize,
}

impl<'a> AuthService<'a> {
    pub fn new(users: UserService, jwt: &'a JwtKeys, access_ttl_secs: usize) -> Self {
        Self {
            users,
            jwt,
            access_ttl_secs,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<TokenBundle, AppError> {
        let email = normalize_email(email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = hash_password(password)?;
        let name = name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let user = self.users.create_user(&email, &password_hash, name).await?;
        tracing::info!(user_id = %user.id, "registered user");

        self.issue_tokens(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenBundle, AppError> {
        let email =
            normalize_email(email).map_err(|_| AppError::unauthorized(INVALID_CREDENTIALS))?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        self.issue_tokens(&user)
    }

    fn issue_tokens(&self, user: &user::Model) -> Result<TokenBundle, AppError> {
        let claims = make_access_claims(&user.id, self.access_ttl_secs);
        let access_token = encode_token(self.jwt, &claims)?;

        Ok(TokenBundle {
            access_token,
            token_type: "Bearer",
            expires_in: self.access_ttl_secs,
        })
    }
}
