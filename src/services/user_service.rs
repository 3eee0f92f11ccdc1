use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoLayerError, UserDao},
    db::entities::user,
    error::AppError,
};

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
}

impl UserService {
    pub fn new(user_dao: UserDao) -> Self {
        Self { user_dao }
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<user::Model>, AppError> {
        match self.user_dao.find_by_id(*id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn require(&self, id: &Uuid) -> Result<user::Model, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_by_email(&normalize_email(email)?).await?)
    }

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<String>,
    ) -> Result<user::Model, AppError> {
        Ok(self.user_dao.create_user(email, password_hash, name).await?)
    }

    pub async fn rename(&self, id: &Uuid, name: Option<String>) -> Result<user::Model, AppError> {
        let name = name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Ok(self.user_dao.update_name(id, name).await?)
    }
}

/// Lowercased and trimmed; rejects anything without a local part and domain.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::bad_request("Invalid email address")),
    }
}
