use book::{NewUser, RecordId, User, UserInfo};
use tracing::{debug, info};

use crate::{
    error::AppError,
    store::{SharedStore, StoreError, now_millis},
};

/// User lookups. Sign-in and sessions live in the proxy in front of us; here
/// users are only names that recipes point at.
#[derive(Clone)]
pub struct Users {
    store: SharedStore,
}

impl Users {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, draft: NewUser) -> Result<User, AppError> {
        let user = User::new(draft.username, now_millis());
        user.validate()?;

        let user = self.store.insert_user(user).await.map_err(|e| match e {
            StoreError::DuplicateUsername(name) => {
                AppError::Conflict(format!("username {name} already taken"))
            }
            other => AppError::Store(other),
        })?;

        info!("Created user {} ({})", user.username, user.id);

        Ok(user)
    }

    pub async fn get_user_info(&self, id: &RecordId) -> Result<Option<UserInfo>, AppError> {
        Ok(self.store.find_user(id).await?.map(|user| user.info()))
    }

    /// Exact username match. Unknown handles are `None`, not an error.
    pub async fn resolve_author_handle(&self, handle: &str) -> Result<Option<RecordId>, AppError> {
        let id = self
            .store
            .find_user_by_username(handle)
            .await?
            .map(|user| user.id);

        if id.is_none() {
            debug!("No user named {handle}");
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    fn users() -> Users {
        Users::new(Arc::new(MemoryStore::new()))
    }

    fn named(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let users = users();
        let user = users.create_user(named("hello")).await.unwrap();

        assert_eq!(users.resolve_author_handle("hello").await.unwrap(), Some(user.id));
        assert_eq!(users.resolve_author_handle("Hello").await.unwrap(), None);
        assert_eq!(
            users.get_user_info(&user.id).await.unwrap(),
            Some(UserInfo {
                username: "hello".to_string()
            })
        );
        assert_eq!(users.get_user_info(&RecordId::generate()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_username_required() {
        let err = users().create_user(named("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("`username` is required"));
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let users = users();
        users.create_user(named("test")).await.unwrap();

        let err = users.create_user(named("test")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
