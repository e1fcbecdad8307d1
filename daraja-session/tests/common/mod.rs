//! Shared helpers for session integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use daraja_core::{storage_error, DarajaResult};
use daraja_session::{
    AuthApi, Clock, CurrentSession, LoginResponse, ManualClock, MemoryNavigator, MemoryStore,
    SessionError, SessionManager, SessionResult, SessionStore, UserProfile,
};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Fixed logical start time (2025-06-15T15:06:40Z)
pub const NOW_MS: i64 = 1_750_000_000_000;
pub const STORAGE_KEY: &str = "daraja.session";
pub const EMAIL: &str = "amina@example.com";
pub const PASSWORD: &str = "correct-horse-battery";

#[derive(Serialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Sign a token the way the backend would
pub fn mint_token(sub: &str, iat_secs: i64, exp_secs: i64) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: sub.to_string(),
            iat: iat_secs,
            exp: exp_secs,
        },
        &jsonwebtoken::EncodingKey::from_secret(b"backend-only-secret"),
    )
    .expect("token encoding")
}

/// Token expiring `secs` seconds after the clock's current time (negative = already expired)
pub fn token_valid_for(clock: &dyn Clock, secs: i64) -> String {
    let now_secs = clock.now_ms() / 1000;
    mint_token("1", now_secs, now_secs + secs)
}

pub fn sample_user() -> UserProfile {
    serde_json::from_value(json!({
        "id": 1,
        "email": EMAIL,
        "name": "Amina Wanjiru",
        "phone": "+254700000001",
        "country": "KE",
        "preferred_currency": "KES"
    }))
    .expect("sample user")
}

pub fn other_user() -> UserProfile {
    UserProfile::new(2, "jean@example.ca").with_name("Jean Tremblay")
}

/// Everything a manager test needs, with handles to inspect collaborators
pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub clock: ManualClock,
    pub store: MemoryStore,
    pub navigator: Arc<MemoryNavigator>,
}

pub fn harness() -> Harness {
    harness_with(MemoryStore::new(), None)
}

pub fn harness_with(store: MemoryStore, api: Option<Arc<dyn AuthApi>>) -> Harness {
    let clock = ManualClock::new(NOW_MS);
    let navigator = Arc::new(MemoryNavigator::new("/dashboard"));

    let mut builder = SessionManager::builder()
        .store(Arc::new(store.clone()))
        .clock(Arc::new(clock.clone()))
        .navigator(navigator.clone())
        .logout_timeout_ms(200);
    if let Some(api) = api {
        builder = builder.api(api);
    }

    Harness {
        manager: builder.build(),
        clock,
        store,
        navigator,
    }
}

/// Store whose operations can be switched off, like disabled local storage.
/// With `gated` set, writes signal `entered` and wait for `release`.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: AtomicBool,
    pub fail_sets: AtomicBool,
    pub fail_removes: AtomicBool,
    pub gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl FlakyStore {
    pub fn fail_writes(&self, failing: bool) {
        self.fail_sets.store(failing, Ordering::SeqCst);
        self.fail_removes.store(failing, Ordering::SeqCst);
    }

    async fn gate(&self) {
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn get(&self, key: &str) -> DarajaResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(storage_error!("SecurityError: storage is disabled", "flaky_store"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DarajaResult<()> {
        self.gate().await;
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(storage_error!("QuotaExceededError", "flaky_store"));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> DarajaResult<()> {
        self.gate().await;
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(storage_error!("SecurityError: storage is disabled", "flaky_store"));
        }
        self.inner.remove(key).await
    }
}

/// How the fake backend answers token-bearing calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Ok,
    Unauthorized,
    Offline,
    /// 200 with a body that is not a session
    Malformed,
}

/// Scriptable in-process auth backend
pub struct MockAuthApi {
    pub behavior: Mutex<Backend>,
    /// Profile returned by `current_session`; defaults to the caller's stored user
    pub server_user: Mutex<Option<UserProfile>>,
    /// Token handed out by `login`
    pub issued_token: Mutex<String>,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub session_calls: AtomicUsize,
    /// When set, `current_session` signals `entered` and waits for `release`
    pub gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl MockAuthApi {
    pub fn new(issued_token: String) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(Backend::Ok),
            server_user: Mutex::new(None),
            issued_token: Mutex::new(issued_token),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            session_calls: AtomicUsize::new(0),
            gated: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn set_behavior(&self, behavior: Backend) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_server_user(&self, user: UserProfile) {
        *self.server_user.lock().unwrap() = Some(user);
    }

    fn behavior(&self) -> Backend {
        *self.behavior.lock().unwrap()
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, email: &str, password: &str) -> SessionResult<LoginResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior() {
            Backend::Offline => return Err(SessionError::network("could not connect to server")),
            Backend::Malformed => return Err(SessionError::malformed("login response")),
            Backend::Ok | Backend::Unauthorized => {}
        }
        if email != EMAIL || password != PASSWORD {
            return Err(SessionError::InvalidCredentials);
        }
        Ok(LoginResponse {
            token: self.issued_token.lock().unwrap().clone(),
            user: sample_user(),
        })
    }

    async fn logout(&self, _token: &str) -> SessionResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior() {
            Backend::Ok | Backend::Malformed => Ok(()),
            Backend::Unauthorized => Err(SessionError::ExpiredToken),
            Backend::Offline => Err(SessionError::network("could not connect to server")),
        }
    }

    async fn current_session(&self, _token: &str) -> SessionResult<CurrentSession> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        match self.behavior() {
            Backend::Ok => {
                let user = self
                    .server_user
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(sample_user);
                Ok(CurrentSession { user })
            }
            Backend::Unauthorized => Err(SessionError::ExpiredToken),
            Backend::Offline => Err(SessionError::network("could not connect to server")),
            Backend::Malformed => Err(SessionError::malformed(
                "session response: expected value at line 1 column 1",
            )),
        }
    }
}

/// Read and parse whatever is persisted under the session key
pub async fn persisted(store: &MemoryStore) -> Option<serde_json::Value> {
    let raw = store.get(STORAGE_KEY).await.unwrap()?;
    Some(serde_json::from_str(&raw).unwrap())
}
