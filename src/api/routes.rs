//! Route table for the HR API.

use super::auth::{authenticate, LoginRequest};
use super::http::{HttpRequest, HttpResponse};
use crate::config::Settings;
use crate::db::EmployeeStore;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 1000;

pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn EmployeeStore>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn EmployeeStore>) -> Self {
        Self { settings, store }
    }

    /// Value for `Access-Control-Allow-Origin`, if the caller may see it.
    pub fn allowed_origin(&self, request_origin: Option<&str>) -> Option<String> {
        let origins = &self.settings.cors_origins;
        if origins.iter().any(|o| o == "*") {
            return Some("*".to_string());
        }
        request_origin
            .filter(|origin| origins.iter().any(|o| o == origin))
            .map(str::to_string)
    }
}

pub async fn handle_request(request: &HttpRequest, state: &AppState) -> HttpResponse {
    debug!("Request: {} {}", request.method, request.path);

    if request.method == "OPTIONS" {
        return HttpResponse::new(204, "");
    }

    let prefix = state.settings.api_prefix.trim_end_matches('/');
    let route = if request.path == "/health" {
        Some("/health")
    } else {
        request.path.strip_prefix(prefix)
    };

    match (request.method.as_str(), route) {
        ("GET", Some("/health")) => health(state),
        ("GET", Some("/health/db")) => database_health(state).await,
        ("POST", Some("/auth/login")) => login(request),
        ("POST", Some("/auth/logout")) => HttpResponse::json(
            200,
            &json!({ "success": true, "message": "Logged out successfully" }),
        ),
        ("GET", Some("/employees")) => list_employees(request, state).await,
        ("GET", Some(route)) if route.starts_with("/employees/") => {
            let employee_id = &route["/employees/".len()..];
            get_employee(employee_id, state).await
        }
        _ => HttpResponse::detail(404, "Not Found"),
    }
}

fn health(state: &AppState) -> HttpResponse {
    let settings = &state.settings;
    HttpResponse::json(
        200,
        &json!({
            "status": "healthy",
            "app": settings.app_name,
            "version": settings.app_version,
            "environment": settings.environment,
        }),
    )
}

async fn database_health(state: &AppState) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::json(200, &json!({ "status": "healthy", "database": "connected" })),
        Err(e) => {
            warn!("Database health check failed: {}", e);
            HttpResponse::json(
                503,
                &json!({ "status": "unhealthy", "database": "disconnected" }),
            )
        }
    }
}

fn login(request: &HttpRequest) -> HttpResponse {
    let credentials: LoginRequest = match serde_json::from_str(request.body.trim()) {
        Ok(credentials) => credentials,
        Err(e) => return HttpResponse::detail(422, &format!("Invalid login body: {}", e)),
    };
    match authenticate(&credentials) {
        Some(response) => HttpResponse::json(200, &response),
        None => HttpResponse::detail(401, "Invalid email or password"),
    }
}

fn page_param(request: &HttpRequest, name: &str, default: usize) -> Result<usize, HttpResponse> {
    match request.query.get(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| HttpResponse::detail(422, &format!("{} must be a non-negative integer", name))),
        None => Ok(default),
    }
}

async fn list_employees(request: &HttpRequest, state: &AppState) -> HttpResponse {
    let skip = match page_param(request, "skip", 0) {
        Ok(skip) => skip,
        Err(response) => return response,
    };
    let limit = match page_param(request, "limit", DEFAULT_PAGE_SIZE) {
        Ok(limit) => limit.min(MAX_PAGE_SIZE),
        Err(response) => return response,
    };

    match state.store.list(skip, limit).await {
        Ok(employees) => HttpResponse::json(200, &employees),
        Err(e) => {
            warn!("Failed to list employees: {}", e);
            HttpResponse::detail(500, "Failed to list employees")
        }
    }
}

async fn get_employee(employee_id: &str, state: &AppState) -> HttpResponse {
    match state.store.get(employee_id).await {
        Ok(Some(employee)) => HttpResponse::json(200, &employee),
        Ok(None) => HttpResponse::detail(404, "Employee not found"),
        Err(e) => {
            warn!("Failed to load employee {}: {}", employee_id, e);
            HttpResponse::detail(500, "Failed to load employee")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{EmployeeRecord, MemoryEmployeeStore};
    use chrono::NaiveDateTime;

    fn state() -> AppState {
        AppState::new(Settings::default(), Arc::new(MemoryEmployeeStore::new()))
    }

    fn request(method: &str, target: &str, body: &str) -> HttpRequest {
        let raw = format!("{} {} HTTP/1.1\r\nHost: test\r\n\r\n{}", method, target, body);
        HttpRequest::parse(&raw).unwrap()
    }

    fn employee(id: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            email: format!("{}@example.local", id),
            first_name: "Georgi".to_string(),
            last_name: "Facello".to_string(),
            department: None,
            position: None,
            phone: None,
            address: None,
            is_active: true,
            hire_date: None,
            created_at: NaiveDateTime::default(),
        }
    }

    #[tokio::test]
    async fn test_health_routes() {
        let state = state();
        let response = handle_request(&request("GET", "/health", ""), &state).await;
        assert_eq!(response.status, 200);
        assert!(response.body.contains("HR Cloud API"));

        let response = handle_request(&request("GET", "/api/v1/health/db", ""), &state).await;
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_login_routes() {
        let state = state();
        let ok = handle_request(
            &request(
                "POST",
                "/api/v1/auth/login",
                r#"{"email":"david.kim@blackflag.hr","password":"Staff123!"}"#,
            ),
            &state,
        )
        .await;
        assert_eq!(ok.status, 200);
        assert!(ok.body.contains("Welcome David Kim!"));

        let denied = handle_request(
            &request(
                "POST",
                "/api/v1/auth/login",
                r#"{"email":"david.kim@blackflag.hr","password":"nope"}"#,
            ),
            &state,
        )
        .await;
        assert_eq!(denied.status, 401);

        let malformed = handle_request(&request("POST", "/api/v1/auth/login", "{"), &state).await;
        assert_eq!(malformed.status, 422);
    }

    #[tokio::test]
    async fn test_employee_routes() {
        let state = state();
        state
            .store
            .upsert_batch(&[employee("10001"), employee("10002")])
            .await
            .unwrap();

        let list = handle_request(&request("GET", "/api/v1/employees?skip=1&limit=10", ""), &state).await;
        assert_eq!(list.status, 200);
        let body: Vec<EmployeeRecord> = serde_json::from_str(&list.body).unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].employee_id, "10002");

        let one = handle_request(&request("GET", "/api/v1/employees/10001", ""), &state).await;
        assert_eq!(one.status, 200);

        let missing = handle_request(&request("GET", "/api/v1/employees/4", ""), &state).await;
        assert_eq!(missing.status, 404);

        let bad = handle_request(&request("GET", "/api/v1/employees?limit=-1", ""), &state).await;
        assert_eq!(bad.status, 422);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = handle_request(&request("DELETE", "/api/v1/employees", ""), &state()).await;
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_allowed_origin() {
        let state = state();
        assert_eq!(state.allowed_origin(None), Some("*".to_string()));

        let mut settings = Settings::default();
        settings.cors_origins = vec!["http://localhost:5173".to_string()];
        let state = AppState::new(settings, Arc::new(MemoryEmployeeStore::new()));
        assert_eq!(
            state.allowed_origin(Some("http://localhost:5173")),
            Some("http://localhost:5173".to_string())
        );
        assert_eq!(state.allowed_origin(Some("http://evil.test")), None);
    }
}
