//! Database repository for user management operations.
//!
//! Provides CRUD operations for managed user records

use crate::database::models::{CreateUser, Gender, UpdateUser, User};
use anyhow::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Filters applied to a user listing.
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    /// Matched against name or country with `LIKE %term%`
    pub search: Option<String>,
    pub gender: Option<Gender>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database.
    ///
    /// # Arguments
    /// * `user` - CreateUser DTO containing user details
    ///
    /// # Returns
    /// The newly created User with all fields populated
    pub async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, birthday, gender, country)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, birthday, gender, country
            "#,
        )
        .bind(&user.name)
        .bind(&user.birthday)
        .bind(user.gender)
        .bind(&user.country)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts many users in one transaction.
    pub async fn create_users(&self, users: &[CreateUser]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for user in users {
            inserted += sqlx::query(
                "INSERT INTO users (name, birthday, gender, country) VALUES (?, ?, ?, ?)",
            )
            .bind(&user.name)
            .bind(&user.birthday)
            .bind(user.gender)
            .bind(&user.country)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Retrieves a user by their unique identifier.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, birthday, gender, country FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves one page of users matching the filter, ordered by id.
    pub async fn list_users(
        &self,
        filter: &UserListFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<User>> {
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT id, name, birthday, gender, country FROM users");
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset as i64);

        let users = query.build_query_as::<User>().fetch_all(self.pool).await?;
        Ok(users)
    }

    /// Counts users matching the filter.
    pub async fn count_users(&self, filter: &UserListFilter) -> Result<u64> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count as u64)
    }

    /// Applies the provided fields to a user.
    ///
    /// # Returns
    /// `true` if a row was updated
    pub async fn update_user(&self, id: i64, changes: &UpdateUser) -> Result<bool> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut fields = query.separated(", ");

        if let Some(name) = &changes.name {
            fields.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(birthday) = &changes.birthday {
            fields.push("birthday = ").push_bind_unseparated(birthday.clone());
        }
        if let Some(gender) = changes.gender {
            fields.push("gender = ").push_bind_unseparated(gender);
        }
        if let Some(country) = &changes.country {
            fields.push("country = ").push_bind_unseparated(country.clone());
        }

        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user.
    ///
    /// # Returns
    /// `true` if a row was removed
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every managed user. Used by forced reseeding.
    pub async fn delete_all_users(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users").execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn push_filter<'q>(query: &mut QueryBuilder<'q, Sqlite>, filter: &UserListFilter) {
    let mut has_where = false;

    if let Some(search) = filter.search.as_deref() {
        let term = format!("%{}%", search);
        query
            .push(" WHERE (name LIKE ")
            .push_bind(term.clone())
            .push(" OR country LIKE ")
            .push_bind(term)
            .push(")");
        has_where = true;
    }

    if let Some(gender) = filter.gender {
        query
            .push(if has_where { " AND " } else { " WHERE " })
            .push("gender = ")
            .push_bind(gender);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn user(name: &str, gender: Gender, country: &str) -> CreateUser {
        CreateUser {
            name: name.to_string(),
            birthday: "1988-02-03".to_string(),
            gender,
            country: country.to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_and_count_with_filters() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        repo.create_users(&[
            user("Alex Martin", Gender::Male, "Canada"),
            user("Maya Khan", Gender::Female, "India"),
            user("Noah Silva", Gender::Male, "Brazil"),
            user("Ivy Lee", Gender::Other, "Canada"),
        ])
        .await
        .unwrap();

        let all = UserListFilter::default();
        assert_eq!(repo.count_users(&all).await.unwrap(), 4);

        let page = repo.list_users(&all, 2, 2).await.unwrap();
        let names: Vec<_> = page.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Noah Silva", "Ivy Lee"]);

        let canada = UserListFilter {
            search: Some("canada".to_string()),
            gender: None,
        };
        assert_eq!(repo.count_users(&canada).await.unwrap(), 2);

        let canadian_men = UserListFilter {
            search: Some("Canada".to_string()),
            gender: Some(Gender::Male),
        };
        let found = repo.list_users(&canadian_men, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Alex Martin");

        let by_name = UserListFilter {
            search: Some("Khan".to_string()),
            gender: None,
        };
        assert_eq!(repo.count_users(&by_name).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        let created = repo
            .create_user(&user("Leo Novak", Gender::Male, "Poland"))
            .await
            .unwrap();

        let changes = UpdateUser {
            country: Some("Norway".to_string()),
            ..Default::default()
        };
        assert!(repo.update_user(created.id, &changes).await.unwrap());
        assert!(!repo.update_user(created.id + 100, &changes).await.unwrap());

        let updated = repo.get_user_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(updated.country, "Norway");
        assert_eq!(updated.name, "Leo Novak");

        assert!(repo.delete_user(created.id).await.unwrap());
        assert!(!repo.delete_user(created.id).await.unwrap());
        assert!(repo.get_user_by_id(created.id).await.unwrap().is_none());
    }
}
