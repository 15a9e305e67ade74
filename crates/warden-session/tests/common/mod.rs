//! Scripted in-process token server shared by the session tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::sync::{Barrier, Notify};
use warden_protocol::{AccessClaims, CredentialPair, paths};
use warden_session::AUTHORIZATION;
use warden_transport::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};

pub const HISTORY: &str = "/history/";
/// Refuses every bearer, even a freshly renewed one.
pub const STAFF_ONLY: &str = "/staff/";

#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: u64,
    pub username: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

pub const ALICE: MockUser = MockUser {
    id: 1,
    username: "alice",
    email: "alice@example.com",
    password: "secret",
};

/// A request as the mock saw it.
#[derive(Debug, Clone)]
pub struct Logged {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
}

/// Lets a test hold a refresh exchange open.
#[derive(Debug, Clone, Default)]
pub struct RefreshPause {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
struct Tokens {
    /// Valid access tokens and the user they belong to.
    access: HashMap<String, u64>,
    /// Valid refresh tokens and the user they belong to.
    refresh: HashMap<String, u64>,
    minted: u64,
    user_endpoint_fails: bool,
    rotate_refresh: bool,
}

/// Token endpoints plus the protected `GET /history/` and `GET /staff/`.
pub struct MockApi {
    users: Vec<MockUser>,
    tokens: Mutex<Tokens>,
    log: Mutex<Vec<Logged>>,
    refresh_calls: AtomicUsize,
    unauthorized: AtomicUsize,
    /// The first `n` 401s from `/history/` wait here for each other.
    burst: Option<(usize, Barrier)>,
    refresh_pause: Option<RefreshPause>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            users: vec![ALICE],
            tokens: Mutex::new(Tokens::default()),
            log: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            unauthorized: AtomicUsize::new(0),
            burst: None,
            refresh_pause: None,
        }
    }

    /// Holds the first `n` unauthorized history responses until all `n`
    /// have been decided, so every request of a burst fails.
    pub fn with_burst(mut self, n: usize) -> Self {
        self.burst = Some((n, Barrier::new(n)));
        self
    }

    pub fn with_refresh_pause(mut self, pause: RefreshPause) -> Self {
        self.refresh_pause = Some(pause);
        self
    }

    pub fn rotating_refresh(self) -> Self {
        self.tokens().rotate_refresh = true;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Issues a valid pair for a user without going through login.
    pub fn issue_pair(&self, user: &MockUser) -> CredentialPair {
        let mut tokens = self.tokens();
        let access = mint_access(&mut tokens, user);
        let refresh = mint_refresh(&mut tokens, user.id);
        CredentialPair::new(access, refresh)
    }

    /// Every access token issued so far stops being accepted.
    pub fn expire_all_access(&self) {
        self.tokens().access.clear();
    }

    /// Every refresh token issued so far stops being accepted.
    pub fn revoke_all_refresh(&self) {
        self.tokens().refresh.clear();
    }

    pub fn fail_user_endpoint(&self) {
        self.tokens().user_endpoint_fails = true;
    }

    pub fn is_valid_access(&self, token: &str) -> bool {
        self.tokens().access.contains_key(token)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|logged| logged.method == method && logged.path == path)
            .count()
    }

    pub fn requests(&self) -> Vec<Logged> {
        self.log.lock().expect("log lock").clone()
    }

    fn tokens(&self) -> std::sync::MutexGuard<'_, Tokens> {
        self.tokens.lock().expect("tokens lock")
    }

    fn user(&self, id: u64) -> Option<&MockUser> {
        self.users.iter().find(|user| user.id == id)
    }

    fn bearer_user(&self, request: &ApiRequest) -> Option<&MockUser> {
        let token = bearer(request)?;
        let id = *self.tokens().access.get(&token)?;
        self.user(id)
    }

    fn login(&self, body: &Value) -> ApiResponse {
        let username = body["username"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();
        let user = self.users.iter().find(|user| {
            (user.username == username || user.email == username)
                && user.password == password
        });

        let Some(user) = user else {
            return respond(
                401,
                json!({"detail": "No active account found with the given credentials"}),
            );
        };
        let pair = self.issue_pair(user);
        respond(
            200,
            json!({
                "access": pair.access,
                "refresh": pair.refresh,
                "username": user.username,
            }),
        )
    }

    fn verify(&self, body: &Value) -> ApiResponse {
        let token = body["token"].as_str().unwrap_or_default();
        if self.is_valid_access(token) {
            respond(200, json!({}))
        } else {
            respond(
                401,
                json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
            )
        }
    }

    async fn refresh(&self, body: &Value) -> ApiResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(pause) = &self.refresh_pause {
            pause.started.notify_one();
            pause.release.notified().await;
        }

        let refresh = body["refresh"].as_str().unwrap_or_default();
        let mut tokens = self.tokens();
        let Some(id) = tokens.refresh.get(refresh).copied() else {
            return respond(
                401,
                json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
            );
        };
        let Some(user) = self.user(id) else {
            return respond(401, json!({"detail": "User not found"}));
        };

        let access = mint_access(&mut tokens, user);
        if tokens.rotate_refresh {
            tokens.refresh.remove(refresh);
            let rotated = mint_refresh(&mut tokens, id);
            respond(200, json!({"access": access, "refresh": rotated}))
        } else {
            respond(200, json!({"access": access}))
        }
    }

    fn user_details(&self, request: &ApiRequest) -> ApiResponse {
        if self.tokens().user_endpoint_fails {
            return respond(500, json!({"detail": "Internal server error"}));
        }
        match self.bearer_user(request) {
            Some(user) => respond(
                200,
                json!({"id": user.id, "username": user.username, "email": user.email}),
            ),
            None => unauthorized(),
        }
    }

    async fn history(&self, request: &ApiRequest) -> ApiResponse {
        if self.bearer_user(request).is_some() {
            return respond(
                200,
                json!([
                    {"id": 2, "predicted_mean_size_nm": 41.7, "created_at": "2026-03-02T10:15:00Z", "image_url": "/media/uploads/sample-2.png"},
                    {"id": 1, "predicted_mean_size_nm": 38.2, "created_at": "2026-03-01T09:00:00Z"},
                ]),
            );
        }

        let seen = self.unauthorized.fetch_add(1, Ordering::SeqCst);
        if let Some((n, barrier)) = &self.burst {
            if seen < *n {
                barrier.wait().await;
            }
        }
        unauthorized()
    }
}

impl HttpTransport for MockApi {
    async fn send(
        &self,
        request: &ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        self.log.lock().expect("log lock").push(Logged {
            method: request.method(),
            path: request.path().to_string(),
            bearer: bearer(request),
        });

        let body: Value = request
            .body()
            .and_then(|body| serde_json::from_slice(body).ok())
            .unwrap_or(Value::Null);

        let response = match (request.method(), request.path()) {
            (Method::Post, paths::TOKEN) => self.login(&body),
            (Method::Post, paths::TOKEN_VERIFY) => self.verify(&body),
            (Method::Post, paths::TOKEN_REFRESH) => self.refresh(&body).await,
            (Method::Get, paths::USER) => self.user_details(request),
            (Method::Get, HISTORY) => self.history(request).await,
            (Method::Get, STAFF_ONLY) => unauthorized(),
            _ => respond(404, json!({"detail": "Not found."})),
        };
        Ok(response)
    }
}

fn mint_access(tokens: &mut Tokens, user: &MockUser) -> String {
    tokens.minted += 1;
    let token = AccessClaims {
        user_id: Some(user.id),
        username: Some(user.username.to_string()),
        email: Some(user.email.to_string()),
        // Doubles as a serial so every token is distinct.
        exp: Some(1_900_000_000 + tokens.minted),
    }
    .encode_unsigned()
    .expect("encode claims");
    tokens.access.insert(token.clone(), user.id);
    token
}

fn mint_refresh(tokens: &mut Tokens, user_id: u64) -> String {
    tokens.minted += 1;
    let token = format!("refresh-{}", tokens.minted);
    tokens.refresh.insert(token.clone(), user_id);
    token
}

fn bearer(request: &ApiRequest) -> Option<String> {
    request
        .header(AUTHORIZATION)?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn respond(status: u16, body: Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string().into_bytes())
}

fn unauthorized() -> ApiResponse {
    respond(
        401,
        json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"}),
    )
}
