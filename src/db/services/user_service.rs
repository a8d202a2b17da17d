use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::db::entities::user;

/// Emails are stored lowercased by the backend.
pub async fn email_exists(db: &DatabaseConnection, email: &str) -> Result<bool, DbErr> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_email_exists() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user::Model {
                id: 1,
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                role: "customer".to_string(),
                created_at: Utc::now(),
            }]])
            .into_connection();

        assert!(email_exists(&db, "Ana@Example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_email_is_free() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        assert!(!email_exists(&db, "new@example.com").await.unwrap());
    }
}
