use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use domains::{Result, UserDirectory, UserRef};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::gateway::{Gateway, StoreError};

// Stays well under SQLite's bound-parameter limit.
const RESOLVE_CHUNK: usize = 500;

/// Read side of the identity collaborator's `users` table.
pub struct SqliteUserDirectory {
    gateway: Gateway,
}

impl SqliteUserDirectory {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Inserts or renames a user. Only the seed tool and tests write here;
    /// in production the identity collaborator owns these rows.
    pub async fn register(&self, user: &UserRef) -> Result<()> {
        self.gateway
            .execute(
                sqlx::query("INSERT INTO users (id, name) VALUES (?, ?) ON CONFLICT (id) DO UPDATE SET name = excluded.name")
                    .bind(user.id)
                    .bind(&user.name),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn resolve(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserRef>> {
        let unique: Vec<Uuid> = ids.iter().copied().collect::<HashSet<_>>().into_iter().collect();
        let mut users = HashMap::with_capacity(unique.len());

        for chunk in unique.chunks(RESOLVE_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new("SELECT id, name FROM users WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let rows = self.gateway.fetch_all(builder.build()).await?;
            for row in rows {
                let user = UserRef {
                    id: row.try_get("id").map_err(StoreError::from)?,
                    name: row.try_get("name").map_err(StoreError::from)?,
                };
                users.insert(user.id, user);
            }
        }

        Ok(users)
    }
}
