use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;
use crate::session::Role;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError> {
        let res = models::user::Entity::find()
            .filter(models::user::Column::Email.eq(email.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.map(AuthUser::from))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError> {
        let res = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user(&self, email: &str, name: &str, role: Role) -> Result<AuthUser, ServiceError> {
        let created = models::user::create(&self.db, email, name, role.as_str()).await?;
        Ok(AuthUser::from(created))
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, ServiceError> {
        let (created, _) = models::user_credentials::create_user_with_password(
            &self.db,
            email,
            name,
            role.as_str(),
            password_hash,
            &password_algorithm,
        )
        .await?;
        Ok(AuthUser::from(created))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }
}
