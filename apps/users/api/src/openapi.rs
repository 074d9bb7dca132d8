use utoipa::OpenApi;

use crate::api::hello;

/// Users API documentation, served at `/api-docs/openapi.json`
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users API",
        version = "0.1.0",
        description = "User directory with uniform response envelopes and request auditing"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    paths(hello::hello, hello::hello_with_name, hello::info),
    components(schemas(hello::ProjectInfo)),
    tags((name = hello::TAG, description = "Greeting and project info")),
    nest(
        (path = "/users", api = domain_users::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
