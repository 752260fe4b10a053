use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use groupdesk::config::{Config, GithubConfig, RegistrationMode};
use groupdesk::github::{GithubApi, GithubError, Repository};

pub const PASSWORD: &str = "password123";

/// In-memory GitHub double. Every user exists unless listed in `missing_users`.
#[derive(Default)]
pub struct StubGithub {
    pub missing_users: Mutex<HashSet<String>>,
    pub existing_repos: Mutex<HashSet<String>>,
    pub failing_invites: Mutex<HashSet<String>>,
    pub lookups_unavailable: AtomicBool,
    pub repo_creation_fails: AtomicBool,
    pub repo_creation_times_out: AtomicBool,
    pub create_attempts: Mutex<Vec<String>>,
    pub created_repos: Mutex<Vec<String>>,
    pub invited: Mutex<Vec<(String, String)>>,
    pub checked_users: Mutex<Vec<String>>,
}

impl StubGithub {
    pub fn missing_user(&self, username: &str) {
        self.missing_users.lock().unwrap().insert(username.to_lowercase());
    }

    pub fn existing_repo(&self, name: &str) {
        self.existing_repos.lock().unwrap().insert(name.to_string());
    }

    pub fn failing_invite(&self, username: &str) {
        self.failing_invites.lock().unwrap().insert(username.to_string());
    }

    pub fn create_attempts(&self) -> Vec<String> {
        self.create_attempts.lock().unwrap().clone()
    }

    pub fn created_repos(&self) -> Vec<String> {
        self.created_repos.lock().unwrap().clone()
    }

    pub fn invited(&self) -> Vec<(String, String)> {
        self.invited.lock().unwrap().clone()
    }
}

#[async_trait]
impl GithubApi for StubGithub {
    async fn user_exists(&self, _token: &str, username: &str) -> Result<bool, GithubError> {
        self.checked_users.lock().unwrap().push(username.to_string());
        if self.lookups_unavailable.load(Ordering::SeqCst) {
            return Err(GithubError::Timeout);
        }
        Ok(!self.missing_users.lock().unwrap().contains(&username.to_lowercase()))
    }

    async fn list_orgs(&self, _token: &str) -> Result<Vec<String>, GithubError> {
        Ok(vec!["cs-course".to_string(), "research-lab".to_string()])
    }

    async fn repo_exists(&self, _token: &str, _org: &str, name: &str) -> Result<bool, GithubError> {
        Ok(self.existing_repos.lock().unwrap().contains(name))
    }

    async fn create_repo(
        &self,
        _token: &str,
        org: &str,
        name: &str,
        _description: &str,
    ) -> Result<Repository, GithubError> {
        self.create_attempts.lock().unwrap().push(name.to_string());
        if self.repo_creation_times_out.load(Ordering::SeqCst) {
            return Err(GithubError::Timeout);
        }
        if self.repo_creation_fails.load(Ordering::SeqCst) {
            return Err(GithubError::Status {
                status: 422,
                message: "Repository creation failed.".to_string(),
            });
        }
        if self.existing_repos.lock().unwrap().contains(name) {
            return Err(GithubError::Status {
                status: 422,
                message: "name already exists on this account".to_string(),
            });
        }
        // Give concurrent requests a chance to interleave.
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.existing_repos.lock().unwrap().insert(name.to_string());
        self.created_repos.lock().unwrap().push(name.to_string());
        Ok(Repository {
            name: name.to_string(),
            full_name: format!("{org}/{name}"),
            html_url: format!("https://github.com/{org}/{name}"),
        })
    }

    async fn add_collaborator(
        &self,
        _token: &str,
        _org: &str,
        repo: &str,
        username: &str,
        _permission: &str,
    ) -> Result<(), GithubError> {
        if self.failing_invites.lock().unwrap().contains(username) {
            return Err(GithubError::Status {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        self.invited
            .lock()
            .unwrap()
            .push((repo.to_string(), username.to_string()));
        Ok(())
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub github: Arc<StubGithub>,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/v1/auth/register",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/api/v1/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Register an instructor with a GitHub token, return the access token.
    pub async fn instructor(&self, username: &str) -> String {
        let (body, status) = self.register(username, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let token = body["access_token"].as_str().unwrap().to_string();

        let (body, status) = self
            .put_auth(
                "/api/v1/users/me/github-token",
                &token,
                &json!({ "token": "ghp_test_token" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "set github token failed: {body}");
        token
    }

    pub async fn bootstrap(&self) -> String {
        self.instructor("prof").await
    }

    /// Create a project, return the project JSON.
    pub async fn create_project(&self, token: &str, min: i32, max: i32, convention: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/projects",
                token,
                &json!({
                    "name": "Compilers",
                    "github_org": "cs-course",
                    "min_students": min,
                    "max_students": max,
                    "group_convention": convention,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create project failed: {body}");
        body
    }

    /// Submit a group through the public link.
    pub async fn submit_group(&self, project: &Value, students: &[(&str, &str)]) -> (Value, StatusCode) {
        let key = project["secret_key"].as_str().unwrap();
        self.submit_group_with_key(project, key, students).await
    }

    pub async fn submit_group_with_key(
        &self,
        project: &Value,
        key: &str,
        students: &[(&str, &str)],
    ) -> (Value, StatusCode) {
        let id = project["id"].as_str().unwrap();
        let students: Vec<Value> = students
            .iter()
            .map(|(name, user)| json!({ "full_name": name, "github_username": user }))
            .collect();
        self.post(
            &format!("/api/v1/public/projects/{id}/{key}/groups"),
            &json!({ "students": students }),
        )
        .await
    }

    pub async fn group_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn member_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM group_members")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database and a stub GitHub.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let db_name = format!("groupdesk_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        encryption_key: "test-encryption-key-32-chars-ok!".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:5173".to_string(),
        registration: RegistrationMode::Open,
        max_body_size: 65_536,
        trusted_proxies: vec![],
        cors_origins: vec!["http://localhost:5173".to_string()],
        log_level: "warn".to_string(),
        github: GithubConfig::default(),
        submission_limit: 100,
        submission_window_secs: 60,
    };

    let github = Arc::new(StubGithub::default());
    let (app, _state) = groupdesk::build_app(pool.clone(), config, github.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        github,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
