//! Startup seeding of the admin credential and demo user records.
//!
//! Demo users come from a fixed-seed generator so every fresh database holds
//! the same data.

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use sqlx::SqlitePool;

use crate::config::SeedConfig;
use crate::database::models::{CreateAuthUser, CreateUser, Gender, Role};
use crate::repositories::auth_user_repository::AuthUserRepository;
use crate::repositories::user_repository::{UserListFilter, UserRepository};

const SEED: u64 = 42;

const FIRST_NAMES: [&str; 20] = [
    "Alex", "Maya", "Daniel", "Sofia", "Leo", "Nora", "Owen", "Lena", "Ethan", "Ivy", "Mateo",
    "Zara", "Noah", "Mila", "Lucas", "Chloe", "Eli", "Ava", "Gabriel", "Aria",
];

const LAST_NAMES: [&str; 20] = [
    "Martin", "Ivanov", "Khan", "Garcia", "Smith", "Novak", "Petrova", "Kim", "Rossi", "Walker",
    "Santos", "Wang", "Silva", "Hansen", "Brown", "Lee", "Muller", "Nowak", "Nguyen", "Patel",
];

const COUNTRIES: [&str; 20] = [
    "United States",
    "Canada",
    "Germany",
    "France",
    "Spain",
    "Italy",
    "Brazil",
    "Mexico",
    "United Kingdom",
    "Norway",
    "Sweden",
    "Poland",
    "Ukraine",
    "Japan",
    "South Korea",
    "Australia",
    "India",
    "Netherlands",
    "Portugal",
    "South Africa",
];

/// Inserts the admin credential unless seeding is disabled or the email is
/// already registered.
///
/// # Returns
/// `true` when a record was inserted
pub async fn seed_admin_user(
    repo: &AuthUserRepository,
    seed: &SeedConfig,
    hash_cost: u32,
) -> Result<bool> {
    if !seed.admin_enabled || seed.admin_email.is_empty() || seed.admin_password.is_empty() {
        return Ok(false);
    }

    if repo.get_by_email(&seed.admin_email).await?.is_some() {
        tracing::info!("Admin seed skipped: {} already exists", seed.admin_email);
        return Ok(false);
    }

    let password = seed.admin_password.clone();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, hash_cost))
        .await
        .context("password hashing task failed")?
        .context("failed to hash admin password")?;

    repo.create_auth_user(CreateAuthUser {
        email: seed.admin_email.clone(),
        password_hash,
        role: Role::Admin,
    })
    .await?;

    tracing::info!("Seeded admin credential for {}", seed.admin_email);
    Ok(true)
}

/// Tops the users table up to `seed.user_count` rows, or replaces every row
/// when `seed.force` is set.
///
/// # Returns
/// Number of rows inserted
pub async fn seed_users(pool: &SqlitePool, seed: &SeedConfig) -> Result<u64> {
    let repo = UserRepository::new(pool);
    let target = u64::from(seed.user_count);
    let existing = repo.count_users(&UserListFilter::default()).await?;

    if !seed.force && existing >= target {
        tracing::info!("User seed skipped: {} users already exist", existing);
        return Ok(0);
    }

    if seed.force && existing > 0 {
        let removed = repo.delete_all_users().await?;
        tracing::info!("Removed {} users before reseeding", removed);
    }

    let to_create = if seed.force { target } else { target - existing };
    if to_create == 0 {
        return Ok(0);
    }

    let users = generate_users(to_create as usize);
    let inserted = repo.create_users(&users).await?;
    tracing::info!("Seeded {} users", inserted);
    Ok(inserted)
}

/// Deterministic demo users: the same count always yields the same records.
pub fn generate_users(count: usize) -> Vec<CreateUser> {
    let mut rng = StdRng::seed_from_u64(SEED);

    (0..count)
        .map(|_| {
            let first = pick(&FIRST_NAMES, &mut rng);
            let last = pick(&LAST_NAMES, &mut rng);
            let birthday = format!(
                "{}-{:02}-{:02}",
                rng.gen_range(1975..=2004),
                rng.gen_range(1..=12),
                rng.gen_range(1..=28)
            );
            let gender = *Gender::ALL.choose(&mut rng).unwrap_or(&Gender::Other);
            let country = pick(&COUNTRIES, &mut rng);

            CreateUser {
                name: format!("{first} {last}"),
                birthday,
                gender,
                country: country.to_string(),
            }
        })
        .collect()
}

fn pick(items: &[&'static str], rng: &mut StdRng) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use validator::Validate;

    fn seed_config(user_count: u32, force: bool) -> SeedConfig {
        SeedConfig {
            admin_enabled: true,
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin12345".to_string(),
            user_count,
            force,
        }
    }

    #[test]
    fn test_generate_users_is_deterministic_and_valid() {
        let first = generate_users(25);
        let second = generate_users(25);
        assert_eq!(first.len(), 25);

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.birthday, b.birthday);
            assert_eq!(a.country, b.country);
            assert_eq!(a.gender, b.gender);
        }

        for user in &first {
            assert!(user.validate().is_ok(), "invalid seed user {:?}", user);
            let year: i32 = user.birthday[..4].parse().unwrap();
            let day: u32 = user.birthday[8..].parse().unwrap();
            assert!((1975..=2004).contains(&year));
            assert!((1..=28).contains(&day));
        }
    }

    #[tokio::test]
    async fn test_seed_users_tops_up_then_skips() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        repo.create_user(&generate_users(1)[0]).await.unwrap();

        assert_eq!(seed_users(&pool, &seed_config(5, false)).await.unwrap(), 4);
        assert_eq!(seed_users(&pool, &seed_config(5, false)).await.unwrap(), 0);
        assert_eq!(repo.count_users(&UserListFilter::default()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_seed_users_force_replaces_rows() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        seed_users(&pool, &seed_config(8, false)).await.unwrap();

        assert_eq!(seed_users(&pool, &seed_config(3, true)).await.unwrap(), 3);
        assert_eq!(repo.count_users(&UserListFilter::default()).await.unwrap(), 3);

        assert_eq!(seed_users(&pool, &seed_config(0, false)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_admin_once() {
        let repo = AuthUserRepository::new(test_pool().await);
        let config = seed_config(0, false);

        assert!(seed_admin_user(&repo, &config, 4).await.unwrap());
        assert!(!seed_admin_user(&repo, &config, 4).await.unwrap());

        let admin = repo.get_by_email("admin@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.token_version, 0);
        assert!(bcrypt::verify("admin12345", &admin.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_seed_admin_disabled() {
        let repo = AuthUserRepository::new(test_pool().await);
        let mut config = seed_config(0, false);
        config.admin_enabled = false;

        assert!(!seed_admin_user(&repo, &config, 4).await.unwrap());
        assert!(repo.get_by_email("admin@example.com").await.unwrap().is_none());
    }
}
