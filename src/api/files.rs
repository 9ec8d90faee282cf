// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File and folder endpoints under `/api/files`.
//!
//! Every handler first turns `{user_id}` into a [`UserNamespace`] owned by the
//! caller, then resolves the captured `{*path}` inside it.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{Auth, AuthenticatedUser},
    error::ApiError,
    state::AppState,
    storage::{BootstrapSeeder, FolderEntry, PathError, UserNamespace},
};

/// Multipart field carrying the uploaded bytes.
pub const FILE_FIELD: &str = "file";

/// Upper bound on an upload request body.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub key: String,
    pub size_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolderResponse {
    pub prefix: String,
    pub deleted_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BootstrapResponse {
    pub keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Folder below the user's root, e.g. `docs/2024`. Blank lists the root.
    pub folder: Option<String>,
}

fn namespace(user: &AuthenticatedUser, user_id: &str) -> Result<UserNamespace, ApiError> {
    Ok(UserNamespace::authorize(user, user_id)?)
}

/// `Content-Disposition` with an ASCII `filename` and an RFC 6266 `filename*`.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

/// Fallback for `/{verb}/{user_id}` and `/{verb}/{user_id}/` with no path.
pub async fn missing_path(
    Auth(user): Auth,
    Path(user_id): Path<String>,
) -> Result<(), ApiError> {
    namespace(&user, &user_id)?;
    Err(PathError::MissingRemainder.into())
}

#[utoipa::path(
    post,
    path = "/api/files/upload/{user_id}/{path}",
    params(
        ("user_id" = String, Path, description = "Owner of the namespace"),
        ("path" = String, Path, description = "Slash-separated path inside the namespace")
    ),
    request_body(content_type = "multipart/form-data", description = "Form with a `file` field"),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = UploadResponse),
        (status = 400, description = "Malformed path or missing file field"),
        (status = 403, description = "Namespace belongs to another user"),
        (status = 503, description = "Storage backend unavailable")
    )
)]
pub async fn upload_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((user_id, path)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let key = namespace(&user, &user_id)?.resolve(&path)?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
            data = Some(bytes);
            break;
        }
    }
    let data = data.ok_or_else(|| {
        ApiError::bad_request(format!("Multipart field '{FILE_FIELD}' is required"))
    })?;

    let size_bytes = state.storage.upload(&key, data).await?;

    Ok(Json(UploadResponse {
        key: key.to_string(),
        size_bytes,
    }))
}

#[utoipa::path(
    get,
    path = "/api/files/download/{user_id}/{path}",
    params(
        ("user_id" = String, Path, description = "Owner of the namespace"),
        ("path" = String, Path, description = "Slash-separated path inside the namespace")
    ),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 403, description = "Namespace belongs to another user"),
        (status = 404, description = "No such file")
    )
)]
pub async fn download_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((user_id, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let key = namespace(&user, &user_id)?.resolve(&path)?;
    let data = state.storage.download(&key).await?;

    let headers = [
        (CONTENT_TYPE, "application/octet-stream".to_string()),
        (CONTENT_DISPOSITION, content_disposition(key.file_name())),
    ];
    Ok((headers, data))
}

#[utoipa::path(
    get,
    path = "/api/files/list/{user_id}",
    params(
        ("user_id" = String, Path, description = "Owner of the namespace"),
        ListQuery
    ),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [FolderEntry]),
        (status = 403, description = "Namespace belongs to another user")
    )
)]
pub async fn list_files(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FolderEntry>>, ApiError> {
    let prefix = namespace(&user, &user_id)?.folder_prefix(query.folder.as_deref())?;
    Ok(Json(state.storage.list_folder(&prefix).await?))
}

#[utoipa::path(
    delete,
    path = "/api/files/delete/{user_id}/{path}",
    params(
        ("user_id" = String, Path, description = "Owner of the namespace"),
        ("path" = String, Path, description = "Slash-separated path inside the namespace")
    ),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = DeleteResponse),
        (status = 403, description = "Namespace belongs to another user")
    )
)]
pub async fn delete_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((user_id, path)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let key = namespace(&user, &user_id)?.resolve(&path)?;
    state.storage.delete(&key).await?;

    Ok(Json(DeleteResponse {
        key: key.to_string(),
        message: "File deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/files/delete-folder/{user_id}/{path}",
    params(
        ("user_id" = String, Path, description = "Owner of the namespace"),
        ("path" = String, Path, description = "Folder inside the namespace")
    ),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = DeleteFolderResponse),
        (status = 403, description = "Namespace belongs to another user"),
        (status = 500, description = "Some keys could not be deleted")
    )
)]
pub async fn delete_folder(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((user_id, path)): Path<(String, String)>,
) -> Result<Json<DeleteFolderResponse>, ApiError> {
    let prefix = namespace(&user, &user_id)?.folder(&path)?;
    let report = state.storage.delete_recursive(&prefix).await?.into_result()?;

    Ok(Json(DeleteFolderResponse {
        prefix: report.prefix,
        deleted_count: report.deleted_count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/files/bootstrap/{user_id}",
    params(("user_id" = String, Path, description = "Owner of the namespace")),
    tag = "Files",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = BootstrapResponse),
        (status = 403, description = "Namespace belongs to another user")
    )
)]
pub async fn bootstrap_user(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<BootstrapResponse>), ApiError> {
    let namespace = namespace(&user, &user_id)?;
    let keys = BootstrapSeeder::new(&state.storage).seed(&namespace).await?;

    Ok((
        StatusCode::CREATED,
        Json(BootstrapResponse {
            keys: keys.iter().map(ToString::to_string).collect(),
        }),
    ))
}
