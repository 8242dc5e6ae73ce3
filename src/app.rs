use axum::{
    Json, Router,
    extract::{Path, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::{AdminPin, Config};
use crate::error::{GpaError, Result};
use crate::login::{self, FinalResults, Flash, PinGate, SessionRegistry, WebSession};
use crate::session::{
    GradeSubmission, SessionState, course_listing, finalize, record_semester, session_key,
};
use crate::store::{FileRecordStore, RecordStore, SavedRecord};
use crate::views::Views;

/// Shared application state
pub struct AppState {
    pub catalog: Catalog,
    pub store: Arc<dyn RecordStore>,
    pub sessions: SessionRegistry,
    pub pin: PinGate,
    pub views: Views,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        store: Arc<dyn RecordStore>,
        pin: &AdminPin,
        session_ttl: Duration,
    ) -> Result<Self> {
        Ok(AppState {
            catalog,
            store,
            sessions: SessionRegistry::new(session_ttl),
            pin: PinGate::from_config(pin)?,
            views: Views::new()?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::bundled()?,
        };
        log::info!("course catalog ready with {} course(s)", catalog.len());

        let store = FileRecordStore::open(&config.data_dir)?;
        Self::new(catalog, Arc::new(store), &config.admin_pin, config.session_ttl)
    }
}

impl IntoResponse for GpaError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            log::error!("{}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/results", get(serve_results))
        .route("/api/courses/:part/:semester", get(get_courses))
        .route("/api/add_semester", post(add_semester))
        .route("/api/reset_session", post(reset_session))
        .route("/api/save_calculation", post(save_calculation))
        .route("/records-admin", get(serve_admin_panel))
        .route(
            "/records-admin/login",
            get(login::serve_admin_login).post(login::handle_admin_login),
        )
        .route("/records-admin/logout", get(login::handle_admin_logout))
        .route("/api/records-admin/records", get(get_admin_records))
        .route("/load_calculation/:record_id", get(load_calculation))
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_config(&config)?);
    let app = router(state);

    let listener = TcpListener::bind(config.bind).await?;
    log::info!("Listening on http://{}", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    log::info!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

/// Body of `POST /api/add_semester`
#[derive(Debug, PartialEq)]
pub struct AddSemesterRequest {
    pub part: String,
    pub semester: String,
    pub grades: Vec<GradeSubmission>,
}

impl AddSemesterRequest {
    /// Validates the raw JSON shape of a submission.
    pub fn from_json(body: &Value) -> Result<Self> {
        let invalid = || GpaError::Validation("Invalid or missing data.".to_string());
        let object = body.as_object().ok_or_else(invalid)?;

        let part = match object.get("part") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(invalid()),
        };
        let semester = match object.get("semester") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(invalid()),
        };
        let items = match object.get("grades") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => return Err(invalid()),
        };

        let mut grades = Vec::with_capacity(items.len());
        for item in items {
            let entry = item.as_object().ok_or_else(|| {
                GpaError::Validation("each grade must be an object".to_string())
            })?;
            let course_code = match entry.get("course_code") {
                Some(Value::String(code)) => code.clone(),
                _ => {
                    return Err(GpaError::Validation(
                        "grade entry is missing course_code".to_string(),
                    ));
                }
            };
            let grade = match entry.get("grade") {
                None | Some(Value::Null) => None,
                Some(Value::String(g)) => Some(g.clone()),
                Some(other) => {
                    return Err(GpaError::Validation(format!(
                        "grade for {} must be a string, got {}",
                        course_code, other
                    )));
                }
            };
            grades.push(GradeSubmission { course_code, grade });
        }

        Ok(AddSemesterRequest {
            part,
            semester,
            grades,
        })
    }
}

async fn serve_index(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    let (cgpa, summary, flashes) = app.sessions.with_session(&session_id, |session| {
        let results = session.state.results();
        (
            results.cumulative_gpa,
            session.state.summary(&results),
            session.take_flashes(),
        )
    });

    match app
        .views
        .index(&app.catalog.semester_parts(), cgpa, &summary, &flashes)
    {
        Ok(page) => (jar, Html(page)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

async fn get_courses(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
    Path((part, semester)): Path<(String, String)>,
) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    let listing = app.sessions.with_session(&session_id, |session| {
        course_listing(&session.state, &app.catalog, &part, &semester)
    });

    match listing {
        Ok(courses) => (jar, Json(courses)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

async fn add_semester(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);

    let outcome = payload
        .map_err(|e| GpaError::Validation(e.body_text()))
        .and_then(|Json(body)| AddSemesterRequest::from_json(&body))
        .and_then(|request| {
            app.sessions.with_session(&session_id, |session| -> Result<Value> {
                let results = record_semester(
                    &mut session.state,
                    &request.part,
                    &request.semester,
                    &request.grades,
                    &app.catalog,
                )?;
                let key = session_key(request.part.trim(), request.semester.trim());
                Ok(json!({
                    "semester_gpa": results.semester_gpa(&key),
                    "cumulative_gpa": results.cumulative_gpa,
                    "session_summary": session.state.summary(&results),
                }))
            })
        });

    match outcome {
        Ok(body) => (jar, Json(body)).into_response(),
        Err(e) => {
            log::debug!("add_semester rejected: {}", e);
            (jar, e).into_response()
        }
    }
}

async fn reset_session(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    app.sessions
        .with_session(&session_id, |session| session.state.reset());
    (jar, Json(json!({ "message": "Session reset successfully" }))).into_response()
}

async fn save_calculation(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);

    // Snapshot under the lock, persist outside it
    let snapshot = app.sessions.with_session(&session_id, |session| {
        finalize(&session.state).map(|results| (session.state.clone(), results))
    });
    let (state, results) = match snapshot {
        Ok(snapshot) => snapshot,
        Err(e) => return (jar, e).into_response(),
    };

    let store = Arc::clone(&app.store);
    let saved = tokio::task::spawn_blocking(move || {
        store
            .save(state.semesters(), &results)
            .map(|record_id| (record_id, state, results))
    })
    .await;

    let (record_id, state, results) = match saved {
        Ok(Ok(saved)) => saved,
        Ok(Err(e)) => return (jar, e).into_response(),
        Err(e) => return (jar, GpaError::Store(e.to_string())).into_response(),
    };

    app.sessions.with_session(&session_id, |session| {
        session.last_results = Some(FinalResults::new(&state, &results));
        session.state.reset();
    });

    (
        jar,
        Json(json!({
            "success": true,
            "record_id": record_id,
            "redirect_url": "/results",
        })),
    )
        .into_response()
}

async fn serve_results(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    let results = app.sessions.with_session(&session_id, |session| {
        let results = session.last_results.take();
        if results.is_none() {
            session.flash(Flash::new(
                "info",
                "No results to display. Please calculate your GPA first.",
            ));
        }
        results
    });

    let Some(results) = results else {
        return (jar, Redirect::to("/")).into_response();
    };
    match app.views.results(&results) {
        Ok(page) => (jar, Html(page)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

async fn serve_admin_panel(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    if !login::is_admin(&app, &session_id) {
        return (jar, Redirect::to("/records-admin/login")).into_response();
    }

    let flashes = app
        .sessions
        .with_session(&session_id, WebSession::take_flashes);
    let page = app
        .store
        .list()
        .and_then(|records| app.views.admin(&records, &flashes));

    match page {
        Ok(page) => (jar, Html(page)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

#[derive(Serialize)]
struct RecordListing<'a> {
    #[serde(flatten)]
    record: &'a SavedRecord,
    formatted_timestamp: String,
}

async fn get_admin_records(State(app): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    if !login::is_admin(&app, &session_id) {
        return (
            StatusCode::UNAUTHORIZED,
            jar,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    match app.store.list() {
        Ok(records) => {
            let listing: Vec<RecordListing> = records
                .iter()
                .map(|record| RecordListing {
                    record,
                    formatted_timestamp: record.formatted_timestamp(),
                })
                .collect();
            (jar, Json(listing)).into_response()
        }
        Err(e) => (jar, e).into_response(),
    }
}

async fn load_calculation(
    State(app): State<Arc<AppState>>,
    jar: CookieJar,
    Path(record_id): Path<String>,
) -> Response {
    let (jar, session_id) = app.sessions.resolve(jar);
    if !login::is_admin(&app, &session_id) {
        return (jar, Redirect::to("/records-admin/login")).into_response();
    }

    let loaded = match Uuid::parse_str(&record_id) {
        Ok(id) => app.store.load_by_id(&id),
        Err(_) => Ok(None),
    };

    let flash = match loaded {
        Ok(Some(record)) => {
            let restored = SessionState::restore(record.semesters, &app.catalog);
            app.sessions
                .with_session(&session_id, |session| session.state = restored);
            log::info!("loaded calculation {} into session", record.record_id);
            let short: String = record_id.chars().take(8).collect();
            Flash::new(
                "success",
                format!("Calculation {}... loaded successfully.", short),
            )
        }
        Ok(None) => Flash::new("error", "Calculation not found."),
        Err(e) => Flash::new("error", format!("Failed to load calculation: {}", e)),
    };
    app.sessions
        .with_session(&session_id, |session| session.flash(flash));

    (jar, Redirect::to("/")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request as HttpRequest, header};
    use tower::ServiceExt;

    const PIN: &str = "4242";

    fn test_state() -> Arc<AppState> {
        Arc::new(
            AppState::new(
                Catalog::bundled().unwrap(),
                Arc::new(FileRecordStore::in_memory()),
                &AdminPin::Plain(PIN.to_string()),
                Duration::from_secs(600),
            )
            .unwrap(),
        )
    }

    struct Client {
        app: Router,
        cookie: Option<String>,
    }

    impl Client {
        fn new(state: Arc<AppState>) -> Self {
            Client {
                app: router(state),
                cookie: None,
            }
        }

        async fn send(&mut self, request: HttpRequest<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
            let mut request = request;
            if let Some(cookie) = &self.cookie {
                request
                    .headers_mut()
                    .insert(header::COOKIE, cookie.parse().unwrap());
            }
            let response = self.app.clone().oneshot(request).await.unwrap();
            if let Some(set) = response.headers().get(header::SET_COOKIE) {
                let pair = set.to_str().unwrap().split(';').next().unwrap().to_string();
                self.cookie = Some(pair);
            }
            let status = response.status();
            let location = response
                .headers()
                .get(header::LOCATION)
                .map(|l| l.to_str().unwrap().to_string());
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, location, body.to_vec())
        }

        async fn get(&mut self, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
            let request = HttpRequest::get(uri).body(Body::empty()).unwrap();
            self.send(request).await
        }

        async fn post_json(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
            let request = HttpRequest::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let (status, _, body) = self.send(request).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }

        async fn post_form(&mut self, uri: &str, form: &str) -> (StatusCode, Option<String>) {
            let request = HttpRequest::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap();
            let (status, location, _) = self.send(request).await;
            (status, location)
        }
    }

    #[test]
    fn test_request_parsing() {
        let body = json!({
            "part": 1,
            "semester": "Harmattan",
            "grades": [
                { "course_code": "EDU101", "grade": "F" },
                { "course_code": "ETL101", "grade": null },
                { "course_code": "ETL103" }
            ]
        });
        let request = AddSemesterRequest::from_json(&body).unwrap();
        assert_eq!(request.part, "1");
        assert_eq!(request.grades.len(), 3);
        assert_eq!(request.grades[0].grade.as_deref(), Some("F"));
        assert_eq!(request.grades[1].grade, None);
        assert_eq!(request.grades[2].grade, None);
    }

    #[test]
    fn test_request_parsing_rejects_bad_shapes() {
        let bad = vec![
            json!([]),
            json!({ "semester": "Rain", "grades": [{ "course_code": "EDU102" }] }),
            json!({ "part": "1", "grades": [{ "course_code": "EDU102" }] }),
            json!({ "part": "1", "semester": "Rain", "grades": [] }),
            json!({ "part": "1", "semester": "Rain", "grades": "A" }),
            json!({ "part": "1", "semester": "Rain", "grades": ["EDU102"] }),
            json!({ "part": "1", "semester": "Rain", "grades": [{ "grade": "A" }] }),
            json!({ "part": "1", "semester": "Rain", "grades": [{ "course_code": "EDU102", "grade": 5 }] }),
        ];
        for body in bad {
            assert!(
                matches!(AddSemesterRequest::from_json(&body), Err(GpaError::Validation(_))),
                "{}",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_add_semester_and_list_carry_overs() {
        let mut client = Client::new(test_state());

        let (status, body) = client
            .post_json(
                "/api/add_semester",
                json!({
                    "part": "1",
                    "semester": "Harmattan",
                    "grades": [
                        { "course_code": "EDU101", "grade": "F" },
                        { "course_code": "ETL101", "grade": "A" }
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["semester_gpa"], json!(2.5));
        assert_eq!(body["cumulative_gpa"], json!(2.5));
        assert_eq!(body["session_summary"][0]["semester"], json!("Harmattan"));

        let (status, _, raw) = client.get("/api/courses/2/Harmattan").await;
        assert_eq!(status, StatusCode::OK);
        let courses: Value = serde_json::from_slice(&raw).unwrap();
        let courses = courses.as_array().unwrap();
        let last = courses.last().unwrap();
        assert_eq!(last["course_code"], json!("EDU101"));
        assert_eq!(last["is_carry_over"], json!(true));

        let (_, _, raw) = client.get("/api/courses/1/Harmattan").await;
        let own: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(own.as_array().unwrap().len(), 6);
        assert_eq!(own[0]["grade"], json!("F"));
    }

    #[tokio::test]
    async fn test_ungraded_carry_over_stays_outstanding() {
        let mut client = Client::new(test_state());
        client
            .post_json(
                "/api/add_semester",
                json!({
                    "part": "1",
                    "semester": "Harmattan",
                    "grades": [
                        { "course_code": "EDU101", "grade": "F" },
                        { "course_code": "ETL101", "grade": "A" }
                    ]
                }),
            )
            .await;

        // Grade the part 2 listing the way the browser client does: only rows with a grade
        let (_, _, raw) = client.get("/api/courses/2/Harmattan").await;
        let listing: Value = serde_json::from_slice(&raw).unwrap();
        let listing = listing.as_array().unwrap();
        assert!(listing.iter().any(|c| c["course_code"] == json!("EDU101")));
        let first = listing[0]["course_code"].clone();
        assert_ne!(first, json!("EDU101"));

        let (status, body) = client
            .post_json(
                "/api/add_semester",
                json!({
                    "part": "2",
                    "semester": "Harmattan",
                    "grades": [{ "course_code": first, "grade": "A" }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_summary"].as_array().unwrap().len(), 2);

        let (_, _, raw) = client.get("/api/courses/3/Harmattan").await;
        let courses: Value = serde_json::from_slice(&raw).unwrap();
        let carried: Vec<&Value> = courses
            .as_array()
            .unwrap()
            .iter()
            .filter(|c| c["is_carry_over"] == json!(true))
            .map(|c| &c["course_code"])
            .collect();
        assert_eq!(carried, vec![&json!("EDU101")]);
    }

    #[tokio::test]
    async fn test_add_semester_errors() {
        let mut client = Client::new(test_state());

        let (status, body) = client
            .post_json(
                "/api/add_semester",
                json!({ "part": "1", "semester": "Rain", "grades": [{ "course_code": "NOPE000", "grade": "A" }] }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Course code not found: NOPE000"));

        let (status, body) = client
            .post_json("/api/add_semester", json!({ "part": "1", "semester": "Rain", "grades": [] }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _, _) = client.get("/api/courses/x/Rain").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_save_flow() {
        let state = test_state();
        let mut client = Client::new(Arc::clone(&state));

        let (status, body) = client.post_json("/api/save_calculation", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("No calculation data to save."));

        client
            .post_json(
                "/api/add_semester",
                json!({ "part": "1", "semester": "Rain", "grades": [{ "course_code": "EDU102", "grade": "B" }] }),
            )
            .await;
        let (status, body) = client.post_json("/api/save_calculation", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["redirect_url"], json!("/results"));
        assert_eq!(state.store.list().unwrap().len(), 1);

        let (status, _, page) = client.get("/results").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(page).unwrap().contains("4.00"));

        // Results are shown once
        let (status, location, _) = client.get("/results").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/"));

        // Session was cleared by the save
        let (status, _) = client.post_json("/api/save_calculation", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reset_session() {
        let state = test_state();
        let mut client = Client::new(state);
        client
            .post_json(
                "/api/add_semester",
                json!({ "part": "1", "semester": "Rain", "grades": [{ "course_code": "EDU102", "grade": "F" }] }),
            )
            .await;
        let (status, _) = client.post_json("/api/reset_session", json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, raw) = client.get("/api/courses/2/Rain").await;
        let courses: Value = serde_json::from_slice(&raw).unwrap();
        assert!(courses.as_array().unwrap().iter().all(|c| c["is_carry_over"] == json!(false)));
    }

    #[tokio::test]
    async fn test_admin_gate_and_load() {
        let state = test_state();
        let mut student = Client::new(Arc::clone(&state));
        student
            .post_json(
                "/api/add_semester",
                json!({ "part": "1", "semester": "Harmattan", "grades": [{ "course_code": "PHL101", "grade": "F" }] }),
            )
            .await;
        student.post_json("/api/save_calculation", json!({})).await;
        let record_id = state.store.list().unwrap()[0].record_id;

        let mut admin = Client::new(Arc::clone(&state));
        let (status, location, _) = admin.get("/records-admin").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/records-admin/login"));
        let (status, _, _) = admin.get("/api/records-admin/records").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, location) = admin.post_form("/records-admin/login", "pin=0000").await;
        assert_eq!(location.as_deref(), Some("/records-admin/login"));
        let (_, location) = admin.post_form("/records-admin/login", &format!("pin={}", PIN)).await;
        assert_eq!(location.as_deref(), Some("/records-admin"));

        let (status, _, page) = admin.get("/records-admin").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(page).unwrap().contains(&record_id.to_string()));

        let (status, _, raw) = admin.get("/api/records-admin/records").await;
        assert_eq!(status, StatusCode::OK);
        let records: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(records[0]["record_id"], json!(record_id.to_string()));
        assert!(records[0]["formatted_timestamp"].is_string());

        let (_, location, _) = admin.get(&format!("/load_calculation/{}", record_id)).await;
        assert_eq!(location.as_deref(), Some("/"));
        let (_, _, raw) = admin.get("/api/courses/2/Harmattan").await;
        let courses: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(courses.as_array().unwrap().last().unwrap()["course_code"], json!("PHL101"));

        let (_, _, page) = admin.get("/").await;
        assert!(String::from_utf8(page).unwrap().contains("loaded successfully"));

        let (_, location, _) = admin.get("/records-admin/logout").await;
        assert_eq!(location.as_deref(), Some("/records-admin/login"));
        let (status, _, _) = admin.get("/api/records-admin/records").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_load_unknown_record_flashes_error() {
        let state = test_state();
        let mut admin = Client::new(state);
        admin.post_form("/records-admin/login", &format!("pin={}", PIN)).await;

        let (_, location, _) = admin.get("/load_calculation/not-a-uuid").await;
        assert_eq!(location.as_deref(), Some("/"));
        let (_, _, page) = admin.get("/").await;
        assert!(String::from_utf8(page).unwrap().contains("Calculation not found."));
    }
}
