//! Operation descriptions for the request audit trail

use axum::http::Method;

/// Describe a request by its method and full path.
pub fn describe_operation(method: &Method, path: &str) -> String {
    let description = if let Some(rest) = path.strip_prefix("/api/users") {
        describe_users(method, rest)
    } else if path.starts_with("/api/hello") {
        "Greeting endpoint call"
    } else if path.starts_with("/api/info") {
        "Get system info"
    } else {
        "Unknown operation"
    };
    description.to_string()
}

fn describe_users(method: &Method, rest: &str) -> &'static str {
    match *method {
        Method::GET => {
            if is_id_segment(rest) {
                "Query user details"
            } else if rest.starts_with("/username/") {
                "Find user by username"
            } else if rest.starts_with("/exists/") {
                "Check username existence"
            } else {
                "List users"
            }
        }
        Method::POST => "Create user",
        Method::PUT => "Update user",
        Method::DELETE => "Delete user",
        _ => "User management operation",
    }
}

/// `/<digits>` and nothing else
fn is_id_segment(rest: &str) -> bool {
    rest.strip_prefix('/')
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}
