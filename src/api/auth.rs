//! Mock authentication against a fixed list of test users.
//!
//! There is no password hashing or session state here; the login only
//! checks the list below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct TestUser {
    pub email: &'static str,
    pub password: &'static str,
    pub role: &'static str,
    pub name: &'static str,
}

/// Same accounts the frontend's mock data uses.
pub const TEST_USERS: &[TestUser] = &[
    TestUser {
        email: "sarah.chen@blackflag.hr",
        password: "Admin123!",
        role: "hr_admin",
        name: "Sarah Chen",
    },
    TestUser {
        email: "hr.manager@blackflag.hr",
        password: "HRPass123!",
        role: "hr_admin",
        name: "HR Manager",
    },
    TestUser {
        email: "marcus.johnson@blackflag.hr",
        password: "Staff123!",
        role: "employee",
        name: "Marcus Johnson",
    },
    TestUser {
        email: "emily.rodriguez@blackflag.hr",
        password: "Staff123!",
        role: "employee",
        name: "Emily Rodriguez",
    },
    TestUser {
        email: "david.kim@blackflag.hr",
        password: "Staff123!",
        role: "employee",
        name: "David Kim",
    },
];

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: Option<UserInfo>,
}

/// Email matches case-insensitively, password exactly.
pub fn authenticate(request: &LoginRequest) -> Option<LoginResponse> {
    let user = TEST_USERS.iter().find(|u| {
        u.email.eq_ignore_ascii_case(&request.email) && u.password == request.password
    })?;

    Some(LoginResponse {
        success: true,
        message: format!("Welcome {}!", user.name),
        user: Some(UserInfo {
            email: user.email.to_string(),
            name: user.name.to_string(),
            role: user.role.to_string(),
        }),
    })
}
