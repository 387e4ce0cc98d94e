#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::HashedSecret;
use auth::PasswordHasher;
use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use chrono::Utc;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;
use tower::ServiceExt;
use user_service::domain::login::models::LoginPolicy;
use user_service::domain::login::models::UserCredential;
use user_service::domain::login::ports::CredentialStore;
use user_service::domain::login::service::LoginService;
use user_service::domain::user::models::User;
use user_service::domain::user::models::UserId;
use user_service::domain::user::models::Username;
use user_service::domain::user::ports::UserRepository;
use user_service::domain::user::service::UserService;
use user_service::inbound::http::router::create_router;
use user_service::user::errors::UserError;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

#[derive(Clone)]
struct StoredUser {
    user: User,
    legacy_password: Option<String>,
    password_hash: Option<HashedSecret>,
}

/// In-memory stand-in for the Postgres store, honoring the same unique-name
/// and conditional-migration rules.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<StoredUser>>,
}

impl InMemoryUserStore {
    /// Insert a user that still carries a plaintext legacy password.
    pub fn seed_legacy_user(&self, name: &str, password: &str) -> UserId {
        let user = User {
            id: UserId::new(),
            name: Username::new(name.to_string()).unwrap(),
            email: None,
            created_at: Utc::now(),
        };
        let id = user.id;
        self.users.lock().unwrap().push(StoredUser {
            user,
            legacy_password: Some(password.to_string()),
            password_hash: None,
        });
        id
    }

    pub fn legacy_password(&self, id: &UserId) -> Option<String> {
        self.find(id).and_then(|stored| stored.legacy_password)
    }

    pub fn password_hash(&self, id: &UserId) -> Option<HashedSecret> {
        self.find(id).and_then(|stored| stored.password_hash)
    }

    fn find(&self, id: &UserId) -> Option<StoredUser> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.user.id == *id)
            .cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn create(&self, user: User, password_hash: HashedSecret) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|stored| stored.user.name == user.name) {
            return Err(UserError::UsernameAlreadyExists(
                user.name.as_str().to_string(),
            ));
        }
        users.push(StoredUser {
            user: user.clone(),
            legacy_password: None,
            password_hash: Some(password_hash),
        });
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.find(id).map(|stored| stored.user))
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .map(|stored| stored.user.clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update(
        &self,
        user: User,
        password_hash: Option<HashedSecret>,
    ) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|stored| stored.user.name == user.name && stored.user.id != user.id)
        {
            return Err(UserError::UsernameAlreadyExists(
                user.name.as_str().to_string(),
            ));
        }
        let stored = users
            .iter_mut()
            .find(|stored| stored.user.id == user.id)
            .ok_or_else(|| UserError::NotFound(user.id.to_string()))?;

        stored.user = user.clone();
        if let Some(hash) = password_hash {
            stored.password_hash = Some(hash);
            stored.legacy_password = None;
        }
        Ok(user)
    }
}

#[async_trait]
impl CredentialStore for InMemoryUserStore {
    async fn find_credential_by_name(
        &self,
        name: &str,
    ) -> Result<Option<UserCredential>, UserError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.user.name.as_str() == name)
            .map(|stored| UserCredential {
                id: stored.user.id,
                name: stored.user.name.as_str().to_string(),
                legacy_password: stored.legacy_password.clone(),
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &HashedSecret,
    ) -> Result<u64, UserError> {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|stored| stored.user.id == *id && stored.password_hash.is_none())
        {
            Some(stored) => {
                stored.password_hash = Some(password_hash.clone());
                stored.legacy_password = None;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub text: String,
    pub body: serde_json::Value,
}

/// The full HTTP application wired to an in-memory store, driven in-process.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryUserStore>,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_policy(LoginPolicy::default())
    }

    pub fn with_policy(policy: LoginPolicy) -> Self {
        let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
        let authenticator = Arc::new(Authenticator::with_password_hasher(
            TEST_SECRET,
            hasher.clone(),
        ));
        let store = Arc::new(InMemoryUserStore::default());

        let user_service = Arc::new(UserService::new(Arc::clone(&store), hasher));
        let login_service = Arc::new(LoginService::new(
            Arc::clone(&store),
            Arc::clone(&authenticator),
            policy,
        ));

        let router = create_router(user_service, login_service, Arc::clone(&authenticator));

        Self {
            router,
            store,
            authenticator,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, None).await
    }

    pub async fn get_with_auth(&self, path: &str, authorization: &str) -> TestResponse {
        self.send(Method::GET, path, None, Some(authorization)).await
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> TestResponse {
        self.send(Method::POST, path, Some(body), None).await
    }

    pub async fn put(&self, path: &str, body: serde_json::Value) -> TestResponse {
        self.send(Method::PUT, path, Some(body), None).await
    }

    /// POST a raw body with a JSON content type, for payloads `json!` cannot express.
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.execute(request).await
    }

    pub async fn login(&self, name: &str, password: &str) -> TestResponse {
        self.post(
            "/login",
            serde_json::json!({ "name": name, "password": password }),
        )
        .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.execute(request).await
    }

    async fn execute(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

        TestResponse { status, text, body }
    }
}

/// Throwaway Postgres database with migrations applied.
///
/// Created only when `DATABASE_URL` points at a reachable server; callers skip
/// otherwise.
pub struct TestDb {
    pub pool: PgPool,
    pub db_name: String,
    server_url: String,
}

impl TestDb {
    pub async fn new() -> Option<Self> {
        let Ok(server_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres test");
            return None;
        };

        let db_name = format!(
            "test_user_service_{}",
            uuid::Uuid::new_v4().to_string().replace('-', "_")
        );

        let mut conn = PgConnection::connect(&server_url)
            .await
            .expect("Failed to connect to Postgres");

        conn.execute(format!(r#"CREATE DATABASE "{}";"#, db_name).as_str())
            .await
            .expect("Failed to create test database");

        let options = server_url
            .parse::<PgConnectOptions>()
            .expect("Failed to parse DATABASE_URL")
            .database(&db_name);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self {
            pool,
            db_name,
            server_url,
        })
    }

    /// Insert a row the way the pre-hashing schema did: plaintext password,
    /// no hash, and no name rules.
    pub async fn seed_legacy_row(&self, name: &str, password: &str) -> UserId {
        let id = UserId::new();
        sqlx::query("INSERT INTO users (id, name, password) VALUES ($1, $2, $3)")
            .bind(id.0)
            .bind(name)
            .bind(password)
            .execute(&self.pool)
            .await
            .expect("Failed to seed legacy user");
        id
    }

    /// Raw `(password, password_hash)` columns for a user.
    pub async fn stored_credential(&self, id: &UserId) -> (Option<String>, Option<String>) {
        sqlx::query_as::<_, (Option<String>, Option<String>)>(
            "SELECT password, password_hash FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to read credential columns")
    }

    pub async fn teardown(self) {
        self.pool.close().await;

        if let Ok(mut conn) = PgConnection::connect(&self.server_url).await {
            let _ = conn
                .execute(
                    format!(
                        r#"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}';"#,
                        self.db_name
                    )
                    .as_str(),
                )
                .await;

            let _ = conn
                .execute(format!(r#"DROP DATABASE IF EXISTS "{}";"#, self.db_name).as_str())
                .await;
        }
    }
}
