//! Session Manager - single source of truth for "who is logged in"
//!
//! Keeps the persisted session record and the in-memory state in lockstep,
//! enforces local token expiry and publishes every change to observers.

use crate::api::AuthApi;
use crate::clock::{Clock, SystemClock};
use crate::monitor::ExpiryMonitor;
use crate::navigation::{Navigator, NoopNavigator};
use crate::state::{AuthSnapshot, AuthStatus, LogoutReason, SessionEvent, ViewScope};
use crate::store::{FileStore, MemoryStore, PersistedSession, SessionStore};
use crate::token::decode_token;
use crate::user::UserProfile;
use crate::{HttpAuthApi, SessionError, SessionResult};
use daraja_core::{
    log_operation_error, log_operation_start, log_operation_success, storage_error, with_timeout,
    DarajaConfig, SessionSettings,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const DEFAULT_LOGOUT_TIMEOUT_MS: u64 = 3000;

/// Outcome of one expiry monitor tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    NoSession,
    Valid { remaining_ms: i64 },
    ExpiringSoon { remaining_ms: i64 },
    /// The session was ended by this check
    Expired,
}

#[derive(Debug)]
struct SessionState {
    status: AuthStatus,
    user: Option<UserProfile>,
    token: Option<String>,
    token_expiry_ms: Option<i64>,
    /// Operations currently showing a spinner
    pending: u32,
    /// Expiry for which the "expiring soon" warning was already sent
    warned_expiry_ms: Option<i64>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: AuthStatus::Unknown,
            user: None,
            token: None,
            token_expiry_ms: None,
            pending: 0,
            warned_expiry_ms: None,
        }
    }

    fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            status: self.status,
            user: self.user.clone(),
            loading: self.pending > 0 || self.status == AuthStatus::Unknown,
            is_authenticated: self.status == AuthStatus::Authenticated,
            token_expiry_ms: self.token_expiry_ms,
        }
    }

    fn authenticate(&mut self, record: PersistedSession, expiry_ms: i64) {
        self.status = AuthStatus::Authenticated;
        self.user = Some(record.user);
        self.token = Some(record.token);
        self.token_expiry_ms = Some(expiry_ms);
        self.warned_expiry_ms = None;
    }

    fn clear(&mut self) {
        self.status = AuthStatus::Unauthenticated;
        self.user = None;
        self.token = None;
        self.token_expiry_ms = None;
        self.warned_expiry_ms = None;
    }

    fn record(&self) -> Option<PersistedSession> {
        match (&self.token, &self.user) {
            (Some(token), Some(user)) => Some(PersistedSession::new(token.clone(), user.clone())),
            _ => None,
        }
    }
}

/// What a restore found in storage
enum RestoreOutcome {
    Empty,
    Discard(LogoutReason),
    Valid {
        record: PersistedSession,
        expiry_ms: i64,
        refreshed: bool,
    },
}

/// Client-side session manager
///
/// Construct once at application start with [`SessionManagerBuilder`] and
/// share the returned `Arc` with every view that needs it.
pub struct SessionManager {
    settings: SessionSettings,
    check_interval: Duration,
    logout_timeout_ms: u64,
    store: Arc<dyn SessionStore>,
    api: Option<Arc<dyn AuthApi>>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    state: RwLock<SessionState>,
    /// Serializes every storage + memory mutation
    op_lock: Mutex<()>,
    /// Bumped by every committed mutation; late restores compare against it
    generation: AtomicU64,
    /// Logout could not clear storage; the stored record must not be trusted
    pending_clear: AtomicBool,
    state_tx: watch::Sender<AuthSnapshot>,
    events: broadcast::Sender<SessionEvent>,
    monitor: std::sync::Mutex<Option<ExpiryMonitor>>,
}

impl SessionManager {
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::new()
    }

    /// Wire up a manager from configuration: file-backed store under the
    /// data directory (memory if none can be resolved) and the HTTP auth API.
    pub async fn open(config: &DarajaConfig) -> SessionResult<Arc<Self>> {
        config.validate()?;

        let store: Arc<dyn SessionStore> = match config.session.resolved_data_dir() {
            Some(dir) => Arc::new(FileStore::open(dir).await?),
            None => {
                warn!("No data directory available, session will not survive restarts");
                Arc::new(MemoryStore::new())
            }
        };
        let api = HttpAuthApi::new(config.api.clone())?;

        Ok(SessionManagerBuilder::new()
            .settings(config.session.clone())
            .logout_timeout_ms(config.api.logout_timeout_ms)
            .store(store)
            .api(Arc::new(api))
            .build())
    }

    /// Current state
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state_tx.subscribe()
    }

    /// Observe discrete session events
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state_tx.borrow().is_authenticated
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.state_tx.borrow().user.clone()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Restore the session persisted by a previous run.
    ///
    /// Never fails: anything unreadable, expired or rejected by the backend
    /// ends as `Unauthenticated` with storage cleared.
    pub async fn restore_session(&self) -> AuthStatus {
        self.restore(None).await
    }

    /// Like [`restore_session`](Self::restore_session), but the result is
    /// dropped if `scope` is unmounted before the restore completes.
    pub async fn restore_session_in(&self, scope: &ViewScope) -> AuthStatus {
        self.restore(Some(scope)).await
    }

    async fn restore(&self, scope: Option<&ViewScope>) -> AuthStatus {
        log_operation_start!("restore_session");
        let generation = self.generation.load(Ordering::SeqCst);
        self.begin_loading().await;

        let outcome = self.load_persisted().await;
        let outcome = self.revalidate(outcome).await;

        let status = {
            let _guard = self.op_lock.lock().await;
            let unmounted = scope.is_some_and(|scope| !scope.is_mounted());
            let superseded = self.generation.load(Ordering::SeqCst) != generation;

            if unmounted || superseded {
                debug!(unmounted, superseded, "Discarding restore result");
                self.state.read().await.status
            } else {
                self.apply_restore(outcome).await
            }
        };

        self.end_loading().await;
        log_operation_success!("restore_session", status = ?status);
        status
    }

    async fn load_persisted(&self) -> RestoreOutcome {
        if self.pending_clear.load(Ordering::SeqCst) {
            if self.clear_storage().await {
                self.pending_clear.store(false, Ordering::SeqCst);
            }
            return RestoreOutcome::Empty;
        }

        let raw = match self.store.get(&self.settings.storage_key).await {
            Ok(Some(raw)) if raw.trim().is_empty() => return RestoreOutcome::Empty,
            Ok(Some(raw)) => raw,
            Ok(None) => return RestoreOutcome::Empty,
            Err(e) => {
                log_operation_error!("restore_session", e, stage = "read");
                return RestoreOutcome::Discard(LogoutReason::CorruptSession);
            }
        };

        let record = match PersistedSession::from_json(&raw) {
            Ok(record) => record,
            Err(e) => {
                log_operation_error!("restore_session", e, stage = "parse");
                return RestoreOutcome::Discard(LogoutReason::CorruptSession);
            }
        };

        let claims = match decode_token(&record.token) {
            Ok(claims) => claims,
            Err(e) => {
                log_operation_error!("restore_session", e, stage = "decode");
                return RestoreOutcome::Discard(LogoutReason::CorruptSession);
            }
        };

        if claims.is_expired_at(self.clock.now_ms()) {
            info!(user_id = %record.user.id, "Clearing expired session");
            return RestoreOutcome::Discard(LogoutReason::Expired);
        }

        RestoreOutcome::Valid {
            record,
            expiry_ms: claims.expires_at_ms(),
            refreshed: false,
        }
    }

    async fn revalidate(&self, outcome: RestoreOutcome) -> RestoreOutcome {
        let (mut record, expiry_ms) = match outcome {
            RestoreOutcome::Valid {
                record, expiry_ms, ..
            } => (record, expiry_ms),
            other => return other,
        };

        let api = match &self.api {
            Some(api) if self.settings.validate_on_restore => api,
            _ => {
                return RestoreOutcome::Valid {
                    record,
                    expiry_ms,
                    refreshed: false,
                }
            }
        };

        match api.current_session(&record.token).await {
            Ok(current) => {
                let refreshed = current.user != record.user;
                record.user = current.user;
                RestoreOutcome::Valid {
                    record,
                    expiry_ms,
                    refreshed,
                }
            }
            Err(SessionError::ExpiredToken) => {
                info!(user_id = %record.user.id, "Backend rejected restored session");
                RestoreOutcome::Discard(LogoutReason::Unauthorized)
            }
            Err(e) => {
                log_operation_error!("restore_session", e, stage = "validate");
                let _ = self.events.send(SessionEvent::ValidationUnavailable {
                    message: e.to_string(),
                });
                RestoreOutcome::Valid {
                    record,
                    expiry_ms,
                    refreshed: false,
                }
            }
        }
    }

    /// Caller holds `op_lock`
    async fn apply_restore(&self, outcome: RestoreOutcome) -> AuthStatus {
        match outcome {
            RestoreOutcome::Empty => {
                let mut state = self.state.write().await;
                state.clear();
                self.publish(&state);
                AuthStatus::Unauthenticated
            }
            RestoreOutcome::Discard(reason) => {
                if !self.clear_storage().await {
                    self.pending_clear.store(true, Ordering::SeqCst);
                }
                {
                    let mut state = self.state.write().await;
                    state.clear();
                    self.publish(&state);
                }
                let _ = self.events.send(SessionEvent::LoggedOut { reason });
                AuthStatus::Unauthenticated
            }
            RestoreOutcome::Valid {
                record,
                expiry_ms,
                refreshed,
            } => {
                let record = if refreshed {
                    match self.persist(&record).await {
                        Ok(()) => record,
                        Err(e) => {
                            // Keep memory in step with what is actually stored
                            log_operation_error!("restore_session", e, stage = "persist");
                            match self.read_persisted().await {
                                Some(stored) if stored.token == record.token => stored,
                                _ => record,
                            }
                        }
                    }
                } else {
                    record
                };

                let user = record.user.clone();
                {
                    let mut state = self.state.write().await;
                    state.authenticate(record, expiry_ms);
                    self.publish(&state);
                }
                info!(user_id = %user.id, "Session restored");
                let _ = self.events.send(SessionEvent::Restored { user });
                AuthStatus::Authenticated
            }
        }
    }

    /// Start a session with a user record and bearer token.
    ///
    /// Fails without touching the current session if the token is
    /// undecodable or already expired, or if it cannot be persisted.
    pub async fn login(&self, user: UserProfile, token: impl Into<String>) -> SessionResult<()> {
        let token = token.into();
        log_operation_start!("login", user_id = %user.id);

        self.begin_loading().await;
        let result = self.start_session(user, token.trim()).await;
        self.end_loading().await;
        result
    }

    async fn start_session(&self, user: UserProfile, token: &str) -> SessionResult<()> {
        let _guard = self.op_lock.lock().await;

        let claims = decode_token(&token).map_err(|e| {
            log_operation_error!("login", e);
            SessionError::malformed(format!("token: {}", e))
        })?;
        if claims.is_expired_at(self.clock.now_ms()) {
            log_operation_error!("login", SessionError::ExpiredToken);
            return Err(SessionError::ExpiredToken);
        }

        let record = PersistedSession::new(token, user);
        let previous = self.state.read().await.record();
        if let Err(e) = self.persist(&record).await {
            log_operation_error!("login", e);
            // Nothing in memory means the stored record is not ours to drop
            if let Some(previous) = previous {
                self.rollback_store(previous).await;
            }
            return Err(e);
        }

        self.pending_clear.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        let user = record.user.clone();
        {
            let mut state = self.state.write().await;
            state.authenticate(record, claims.expires_at_ms());
            self.publish(&state);
        }

        log_operation_success!("login", user_id = %user.id);
        let _ = self.events.send(SessionEvent::LoggedIn { user });
        Ok(())
    }

    /// Authenticate against the backend, then start the session
    pub async fn login_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> SessionResult<UserProfile> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(SessionError::validation("email and password are required"));
        }
        let api = self
            .api
            .as_ref()
            .ok_or_else(|| SessionError::validation("no authentication API configured"))?;

        self.begin_loading().await;
        let response = api.login(email, password).await;
        self.end_loading().await;

        let response = response.map_err(|e| {
            log_operation_error!("login_with_credentials", e);
            e
        })?;
        let user = response.user.clone();
        self.login(response.user, response.token).await?;
        Ok(user)
    }

    /// End the session. Always succeeds locally, whatever the backend says.
    pub async fn logout(&self) {
        self.end_session(LogoutReason::UserInitiated, None).await;
    }

    /// End the session without contacting the backend
    pub async fn expire(&self, reason: LogoutReason) {
        self.end_session(reason, None).await;
    }

    /// Expire only if `token` is still the active credential
    pub(crate) async fn expire_token(&self, token: &str, reason: LogoutReason) {
        self.end_session(reason, Some(token)).await;
    }

    async fn end_session(&self, reason: LogoutReason, expected_token: Option<&str>) {
        {
            let state = self.state.read().await;
            if state.status == AuthStatus::Unauthenticated && state.token.is_none() {
                debug!(?reason, "No session to end");
                return;
            }
        }

        self.begin_loading().await;
        self.close_session(reason, expected_token).await;
        self.end_loading().await;
    }

    async fn close_session(&self, reason: LogoutReason, expected_token: Option<&str>) {
        let token = {
            let _guard = self.op_lock.lock().await;
            let mut state = self.state.write().await;

            if let Some(expected) = expected_token {
                if state.token.as_deref() != Some(expected) {
                    debug!(?reason, "Session already replaced, not ending it");
                    return;
                }
            }
            if state.status == AuthStatus::Unauthenticated && state.token.is_none() {
                debug!(?reason, "No session to end");
                return;
            }

            self.generation.fetch_add(1, Ordering::SeqCst);
            if !self.clear_storage().await {
                // Later restores must not pick the record back up
                self.pending_clear.store(true, Ordering::SeqCst);
            }

            let token = state.token.take();
            if let Some(user) = &state.user {
                info!(user_id = %user.id, ?reason, "Session ended");
            }
            state.clear();
            self.publish(&state);
            token
        };

        let _ = self.events.send(SessionEvent::LoggedOut { reason });

        if reason == LogoutReason::UserInitiated {
            if let (Some(api), Some(token)) = (&self.api, token) {
                self.revoke_remote(api.as_ref(), &token).await;
            }
        }

        self.redirect_to_login();
    }

    async fn revoke_remote(&self, api: &dyn AuthApi, token: &str) {
        match with_timeout(api.logout(token), self.logout_timeout_ms, "remote_logout").await {
            Ok(Ok(())) => debug!("Backend acknowledged logout"),
            Ok(Err(e)) => debug!(error = %e, "Ignoring remote logout failure"),
            Err(e) => debug!(error = %e, "Ignoring remote logout timeout"),
        }
    }

    fn redirect_to_login(&self) {
        let route = self.navigator.current_route();
        if self.settings.is_public_route(&route) {
            debug!(route = %route, "Already on a public route, not redirecting");
            return;
        }
        self.navigator.redirect(&self.settings.login_route);
    }

    /// Merge `patch` (a JSON object) into the current user and persist it.
    /// The token is left untouched.
    pub async fn update_user(&self, patch: serde_json::Value) -> SessionResult<UserProfile> {
        self.begin_loading().await;
        let result = self.apply_user_patch(&patch).await;
        self.end_loading().await;
        result
    }

    async fn apply_user_patch(&self, patch: &serde_json::Value) -> SessionResult<UserProfile> {
        let _guard = self.op_lock.lock().await;

        let previous = self
            .state
            .read()
            .await
            .record()
            .ok_or(SessionError::NoActiveSession)?;

        let merged = previous.user.merged(patch)?;
        let record = PersistedSession::new(previous.token.clone(), merged.clone());
        if let Err(e) = self.persist(&record).await {
            log_operation_error!("update_user", e);
            self.rollback_store(previous).await;
            return Err(e);
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.state.write().await;
            state.user = Some(merged.clone());
            self.publish(&state);
        }

        debug!(user_id = %merged.id, "User profile updated");
        let _ = self.events.send(SessionEvent::UserUpdated {
            user: merged.clone(),
        });
        Ok(merged)
    }

    /// Re-fetch the user profile from the backend
    pub async fn refresh_user(&self) -> SessionResult<UserProfile> {
        let token = self.get_token().await.ok_or(SessionError::NoActiveSession)?;
        let api = self
            .api
            .as_ref()
            .ok_or_else(|| SessionError::validation("no authentication API configured"))?;

        let current = match api.current_session(&token).await {
            Ok(current) => current,
            Err(SessionError::ExpiredToken) => {
                self.expire_token(&token, LogoutReason::Unauthorized).await;
                return Err(SessionError::ExpiredToken);
            }
            Err(e) => {
                log_operation_error!("refresh_user", e);
                return Err(e);
            }
        };

        let _guard = self.op_lock.lock().await;
        let previous = match self.state.read().await.record() {
            Some(previous) if previous.token == token => previous,
            _ => return Err(SessionError::NoActiveSession),
        };

        let record = PersistedSession::new(token, current.user);
        if let Err(e) = self.persist(&record).await {
            log_operation_error!("refresh_user", e);
            self.rollback_store(previous).await;
            return Err(e);
        }

        self.generation.fetch_add(1, Ordering::SeqCst);

        let user = record.user.clone();
        {
            let mut state = self.state.write().await;
            state.user = Some(record.user);
            self.publish(&state);
        }
        let _ = self.events.send(SessionEvent::UserUpdated { user: user.clone() });
        Ok(user)
    }

    /// The bearer token, only while it is unexpired by the local clock
    pub async fn get_token(&self) -> Option<String> {
        let state = self.state.read().await;
        let expiry_ms = state.token_expiry_ms?;
        if self.clock.now_ms() >= expiry_ms {
            return None;
        }
        state.token.clone()
    }

    /// One expiry monitor tick
    pub async fn check_expiry(&self) -> ExpiryCheck {
        let now = self.clock.now_ms();
        let (token, expiry_ms) = {
            let state = self.state.read().await;
            match (&state.token, state.token_expiry_ms) {
                (Some(token), Some(expiry_ms)) if state.status == AuthStatus::Authenticated => {
                    (token.clone(), expiry_ms)
                }
                _ => return ExpiryCheck::NoSession,
            }
        };

        if now >= expiry_ms {
            info!("Session token expired");
            self.expire_token(&token, LogoutReason::Expired).await;
            return ExpiryCheck::Expired;
        }

        let remaining_ms = expiry_ms - now;
        let warning_ms = i64::try_from(self.settings.expiry_warning_secs)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        if remaining_ms > warning_ms {
            return ExpiryCheck::Valid { remaining_ms };
        }

        let first_warning = {
            let mut state = self.state.write().await;
            if state.token_expiry_ms == Some(expiry_ms) && state.warned_expiry_ms != Some(expiry_ms)
            {
                state.warned_expiry_ms = Some(expiry_ms);
                true
            } else {
                false
            }
        };
        if first_warning {
            debug!(remaining_ms, "Session expiring soon");
            let _ = self.events.send(SessionEvent::ExpiringSoon { remaining_ms });
        }
        ExpiryCheck::ExpiringSoon { remaining_ms }
    }

    /// Start the periodic expiry check. Must be called inside a tokio runtime.
    /// Calling it again replaces the running monitor.
    pub fn start_expiry_monitor(self: &Arc<Self>) {
        let monitor = ExpiryMonitor::spawn(Arc::downgrade(self), self.check_interval);
        let mut slot = self.monitor.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Some(monitor);
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(ExpiryMonitor::is_running)
    }

    /// Stop background work. The session itself is left as is.
    pub fn shutdown(&self) {
        let monitor = self.monitor.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(monitor) = monitor {
            monitor.stop();
            info!("Session manager shut down");
        }
    }

    async fn persist(&self, record: &PersistedSession) -> SessionResult<()> {
        let key = &self.settings.storage_key;
        let value = record.to_json()?;

        self.store
            .set(key, &value)
            .await
            .map_err(SessionError::StorageUnavailable)?;

        if self.settings.verify_writes {
            let stored = self
                .store
                .get(key)
                .await
                .map_err(SessionError::StorageUnavailable)?;
            if stored.as_deref() != Some(value.as_str()) {
                return Err(SessionError::StorageUnavailable(storage_error!(
                    "Stored session did not read back",
                    "session_manager"
                )));
            }
        }
        Ok(())
    }

    async fn read_persisted(&self) -> Option<PersistedSession> {
        let raw = self.store.get(&self.settings.storage_key).await.ok()??;
        PersistedSession::from_json(&raw).ok()
    }

    /// Remove the stored record, overwriting it with an empty value if
    /// removal fails. Returns false if neither worked.
    async fn clear_storage(&self) -> bool {
        let key = &self.settings.storage_key;
        let Err(e) = self.store.remove(key).await else {
            return true;
        };
        e.log();

        match self.store.set(key, "").await {
            Ok(()) => {
                debug!("Session record blanked after failed removal");
                true
            }
            Err(e) => {
                e.log();
                false
            }
        }
    }

    /// Best effort: put storage back to the record memory still holds
    async fn rollback_store(&self, previous: PersistedSession) {
        let result = match previous.to_json() {
            Ok(value) => self.store.set(&self.settings.storage_key, &value).await,
            Err(_) => return,
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to roll back session storage");
        }
    }

    async fn begin_loading(&self) {
        let mut state = self.state.write().await;
        state.pending += 1;
        self.publish(&state);
    }

    async fn end_loading(&self) {
        let mut state = self.state.write().await;
        state.pending = state.pending.saturating_sub(1);
        self.publish(&state);
    }

    fn publish(&self, state: &SessionState) {
        let snapshot = state.snapshot();
        self.state_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

/// Builder for [`SessionManager`]
pub struct SessionManagerBuilder {
    settings: SessionSettings,
    check_interval: Option<Duration>,
    logout_timeout_ms: u64,
    store: Option<Arc<dyn SessionStore>>,
    api: Option<Arc<dyn AuthApi>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SessionManagerBuilder {
    pub fn new() -> Self {
        Self {
            settings: SessionSettings::default(),
            check_interval: None,
            logout_timeout_ms: DEFAULT_LOGOUT_TIMEOUT_MS,
            store: None,
            api: None,
            navigator: None,
            clock: None,
        }
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the monitor period (defaults to `expiry_check_interval_secs`)
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = Some(interval);
        self
    }

    pub fn logout_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.logout_timeout_ms = timeout_ms;
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn api(mut self, api: Arc<dyn AuthApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Arc<SessionManager> {
        let state = SessionState::new();
        let (state_tx, _) = watch::channel(state.snapshot());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let default_interval = self.settings.expiry_check_interval_secs.max(1);
        let check_interval = self
            .check_interval
            .unwrap_or_else(|| Duration::from_secs(default_interval));

        Arc::new(SessionManager {
            settings: self.settings,
            check_interval,
            logout_timeout_ms: self.logout_timeout_ms,
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            api: self.api,
            navigator: self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            state: RwLock::new(state),
            op_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            pending_clear: AtomicBool::new(false),
            state_tx,
            events,
            monitor: std::sync::Mutex::new(None),
        })
    }
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
