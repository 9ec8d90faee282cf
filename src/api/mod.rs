// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{state::AppState, storage::FolderEntry};

pub mod files;
pub mod health;

pub fn router(state: AppState) -> Router {
    let file_routes = Router::new()
        .route(
            "/upload/{user_id}/{*path}",
            post(files::upload_file).layer(DefaultBodyLimit::max(files::MAX_UPLOAD_BYTES)),
        )
        .route("/download/{user_id}/{*path}", get(files::download_file))
        .route("/list/{user_id}", get(files::list_files))
        .route("/list/{user_id}/", get(files::list_files))
        .route("/delete/{user_id}/{*path}", delete(files::delete_file))
        .route("/delete-folder/{user_id}/{*path}", delete(files::delete_folder))
        .route("/bootstrap/{user_id}", post(files::bootstrap_user))
        // `{*path}` never matches an empty remainder
        .route("/upload/{user_id}", post(files::missing_path))
        .route("/upload/{user_id}/", post(files::missing_path))
        .route("/download/{user_id}", get(files::missing_path))
        .route("/download/{user_id}/", get(files::missing_path))
        .route("/delete/{user_id}", delete(files::missing_path))
        .route("/delete/{user_id}/", delete(files::missing_path))
        .route("/delete-folder/{user_id}", delete(files::missing_path))
        .route("/delete-folder/{user_id}/", delete(files::missing_path));

    let app_routes = Router::new()
        .nest("/api/files", file_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(app_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        files::upload_file,
        files::download_file,
        files::list_files,
        files::delete_file,
        files::delete_folder,
        files::bootstrap_user,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            FolderEntry,
            files::UploadResponse,
            files::DeleteResponse,
            files::DeleteFolderResponse,
            files::BootstrapResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Files", description = "Per-user file and folder storage"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
