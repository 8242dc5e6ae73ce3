#![cfg(not(tarpaulin_include))]

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::app::AppState;
use crate::config::AdminPin;
use crate::error::{GpaError, Result};
use crate::grades::GpaResult;
use crate::session::{SemesterSummary, SessionState};

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flash {
    /// "success", "error" or "info"
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn new(category: &str, message: impl Into<String>) -> Self {
        Flash {
            category: category.to_string(),
            message: message.into(),
        }
    }
}

/// Results of the last saved calculation, kept for the results page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FinalResults {
    pub cumulative_gpa: f64,
    pub semester_gpas: Vec<SemesterSummary>,
    pub total_units_taken: u32,
    pub total_credit_points: u32,
    pub total_courses: usize,
}

impl FinalResults {
    pub fn new(state: &SessionState, results: &GpaResult) -> Self {
        FinalResults {
            cumulative_gpa: results.cumulative_gpa,
            semester_gpas: state.summary(results),
            total_units_taken: results.total_units_taken,
            total_credit_points: results.total_credit_points,
            total_courses: results.total_courses,
        }
    }
}

/// Server-side data attached to a browser session
#[derive(Debug, Clone)]
pub struct WebSession {
    pub state: SessionState,
    pub admin_authenticated: bool,
    pub last_results: Option<FinalResults>,
    pub flashes: Vec<Flash>,
    pub expires_at: SystemTime,
}

impl WebSession {
    fn new(ttl: Duration) -> Self {
        WebSession {
            state: SessionState::new(),
            admin_authenticated: false,
            last_results: None,
            flashes: Vec::new(),
            expires_at: SystemTime::now() + ttl,
        }
    }

    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

/// Active browser sessions, keyed by cookie value.
///
/// Each request works on its own session under the write lock; two tabs
/// sharing a cookie simply see the last write.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, WebSession>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, WebSession>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, WebSession>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the live session named by the cookie, starting a new one if
    /// the cookie is missing, unknown or expired.
    pub fn resolve(&self, jar: CookieJar) -> (CookieJar, String) {
        let now = SystemTime::now();
        let mut sessions = self.write();
        sessions.retain(|_, s| s.expires_at > now);

        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            if let Some(session) = sessions.get_mut(cookie.value()) {
                session.expires_at = now + self.ttl;
                let id = cookie.value().to_string();
                return (jar, id);
            }
        }

        let session_id = Uuid::new_v4().to_string();
        sessions.insert(session_id.clone(), WebSession::new(self.ttl));
        log::debug!("started session {}", session_id);

        let cookie = Cookie::build((SESSION_COOKIE, session_id.clone()))
            .path("/")
            .http_only(true)
            .build();
        (jar.add(cookie), session_id)
    }

    /// Runs `f` against a session. A session evicted in between is recreated empty.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut WebSession) -> R) -> R {
        let mut sessions = self.write();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| WebSession::new(self.ttl));
        f(session)
    }
}

/// Admin PIN check
pub struct PinGate {
    hash: String,
}

impl PinGate {
    pub fn from_config(pin: &AdminPin) -> Result<Self> {
        let hash = match pin {
            AdminPin::Hash(hash) => {
                PasswordHash::new(hash)
                    .map_err(|e| GpaError::Config(format!("invalid admin PIN hash: {}", e)))?;
                hash.clone()
            }
            AdminPin::Plain(pin) => hash_pin(pin)?,
        };
        Ok(PinGate { hash })
    }

    pub fn verify(&self, pin: &str) -> bool {
        verify_pin(pin.trim(), &self.hash).unwrap_or(false)
    }
}

/// Hash a PIN with Argon2 and a random salt
pub fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(pin.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err(GpaError::Config("PIN hashing failed".to_string())),
    }
}

fn verify_pin(pin: &str, hash: &str) -> Result<bool> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err(GpaError::Config("Invalid PIN hash format".to_string())),
    };

    match Argon2::default().verify_password(pin.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Admin login form data
#[derive(Debug, Deserialize)]
pub struct PinForm {
    #[serde(default)]
    pub pin: String,
}

/// Serve the admin login page
pub async fn serve_admin_login(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    let flashes = app
        .sessions
        .with_session(&session_id, WebSession::take_flashes);

    match app.views.admin_login(&flashes) {
        Ok(page) => (jar, Html(page)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

/// Handle admin PIN submission
pub async fn handle_admin_login(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<PinForm>,
) -> (CookieJar, Redirect) {
    let (jar, session_id) = app.sessions.resolve(jar);
    let accepted = app.pin.verify(&form.pin);

    app.sessions.with_session(&session_id, |session| {
        if accepted {
            session.admin_authenticated = true;
        } else {
            session.flash(Flash::new("error", "Invalid PIN."));
        }
    });

    if accepted {
        log::info!("admin login accepted");
        (jar, Redirect::to("/records-admin"))
    } else {
        log::warn!("admin login rejected");
        (jar, Redirect::to("/records-admin/login"))
    }
}

/// Handle admin logout
pub async fn handle_admin_logout(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let (jar, session_id) = app.sessions.resolve(jar);
    app.sessions.with_session(&session_id, |session| {
        session.admin_authenticated = false;
        session.flash(Flash::new("success", "You have been logged out."));
    });
    (jar, Redirect::to("/records-admin/login"))
}

/// True when the session has passed the PIN gate
pub fn is_admin(app: &AppState, session_id: &str) -> bool {
    app.sessions
        .with_session(session_id, |session| session.admin_authenticated)
}
