//! Report endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;
use worklog_common::{generate_storage_key, AppError, AppResult, IdGenerator};
use worklog_core::{
    CreateReportInput, ReportQuery, ReportView, TagsInput, UpdateReportInput,
};
use worklog_db::entities::report::{Attachment, ReportStatus};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ok, ApiResponse},
};

/// Create-report request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[validate(range(min = 1, max = 53))]
    pub week: i32,

    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,

    #[validate(range(min = 1, max = 12))]
    pub month: Option<i32>,

    pub achievements: Option<String>,
    pub challenges: Option<String>,
    pub next_week_plan: Option<String>,

    /// `draft` (default) or `submitted`.
    pub status: Option<ReportStatus>,
    pub tags: Option<TagsInput>,
}

/// Update-report request. Status is absent on purpose; transitions go
/// through the dedicated sub-routes.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReportRequest {
    #[validate(range(min = 1, max = 53))]
    pub week: Option<i32>,

    #[validate(range(min = 2000, max = 2100))]
    pub year: Option<i32>,

    #[validate(range(min = 1, max = 12))]
    pub month: Option<i32>,

    pub achievements: Option<String>,
    pub challenges: Option<String>,
    pub next_week_plan: Option<String>,
    pub tags: Option<TagsInput>,
}

/// List query parameters, shared by the owner and admin listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub department: Option<String>,
    pub user_id: Option<String>,
}

impl From<ListQuery> for ReportQuery {
    fn from(q: ListQuery) -> Self {
        Self {
            q: q.q,
            status: q.status,
            tags: q.tags,
            start: q.start,
            end: q.end,
            department: q.department,
            user_id: q.user_id,
        }
    }
}

/// Approve/reject request body.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    pub comment: Option<String>,
}

/// Create a report.
async fn create_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<ApiResponse<ReportView>> {
    req.validate()?;

    let input = CreateReportInput {
        week: req.week,
        year: req.year,
        month: req.month,
        achievements: req.achievements,
        challenges: req.challenges,
        next_week_plan: req.next_week_plan,
        status: req.status,
        tags: req.tags,
    };

    let report = state.report_service.create(&user, input).await?;
    let view = state.report_service.view(report).await?;
    Ok(ApiResponse::ok(view))
}

/// List the caller's own reports.
async fn list_my_reports(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ReportView>>> {
    let views = state.report_service.list_mine(&user, &query.into()).await?;
    Ok(ApiResponse::ok(views))
}

/// List reports across all owners. Admin only.
async fn list_all_reports(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<ReportView>>> {
    let views = state.report_service.list_all(&user, &query.into()).await?;
    Ok(ApiResponse::ok(views))
}

/// Fetch a single report.
async fn get_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state.report_service.get(&user, &id).await?;
    let view = state.report_service.view(report).await?;
    Ok(ApiResponse::ok(view))
}

/// Update report content.
async fn update_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateReportRequest>,
) -> AppResult<ApiResponse<ReportView>> {
    req.validate()?;

    let input = UpdateReportInput {
        week: req.week,
        year: req.year,
        month: req.month,
        achievements: req.achievements,
        challenges: req.challenges,
        next_week_plan: req.next_week_plan,
        tags: req.tags,
    };

    let report = state.report_service.update(&user, &id, input).await?;
    let view = state.report_service.view(report).await?;
    Ok(ApiResponse::ok(view))
}

/// Delete a report.
async fn delete_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.report_service.delete(&user, &id).await?;
    Ok(ok())
}

/// Submit a draft (or resubmit a rejected report).
async fn submit_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state.report_service.submit(&user, &id).await?;
    let view = state.report_service.view(report).await?;
    Ok(ApiResponse::ok(view))
}

/// Approve a submitted report. Admin only.
async fn approve_report(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<DecisionRequest>>,
) -> AppResult<ApiResponse<ReportView>> {
    let comment = body.and_then(|Json(req)| req.comment);
    let report = state.report_service.approve(&user, &id, comment).await?;
    let view = state.report_service.view(report).await?;
    Ok(ApiResponse::ok(view))
}

/// Reject a submitted report. Admin only; comment mandatory.
async fn reject_report(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<DecisionRequest>>,
) -> AppResult<ApiResponse<ReportView>> {
    let comment = body.and_then(|Json(req)| req.comment);
    let report = state.report_service.reject(&user, &id, comment).await?;
    let view = state.report_service.view(report).await?;
    Ok(ApiResponse::ok(view))
}

/// Upload attachments via multipart form and append them to a report.
async fn upload_attachments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ReportView>> {
    let id_gen = IdGenerator::new();
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .map_or_else(|| "attachment".to_string(), ToString::to_string);
        let mime = field
            .content_type()
            .map_or_else(|| "application/octet-stream".to_string(), ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if data.len() as u64 > state.max_attachment_bytes {
            return Err(AppError::BadRequest(format!(
                "attachment '{original_name}' exceeds the {} byte limit",
                state.max_attachment_bytes
            )));
        }

        let key = generate_storage_key(&id_gen.generate(), &original_name);
        let blob = state.storage.upload(&key, &data, &mime).await?;

        attachments.push(Attachment {
            key: blob.key,
            original_name,
            mime: blob.content_type,
            size: Some(blob.size),
            url: blob.url,
        });
    }

    if attachments.is_empty() {
        return Err(AppError::BadRequest(
            "no 'file' fields in upload".to_string(),
        ));
    }

    let report = state
        .report_service
        .add_attachments(&user, &id, attachments)
        .await?;
    let view = state.report_service.view(report).await?;
    Ok(ApiResponse::ok(view))
}

/// Serve a stored attachment blob by its storage key.
///
/// Keys are opaque and unguessable; like the rest of the attachment
/// URLs this route carries no auth of its own.
async fn serve_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let data = state.storage.download(&key).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_reports).post(create_report))
        .route("/mine", get(list_my_reports))
        .route("/uploads/{key}", get(serve_upload))
        .route(
            "/{id}",
            get(get_report).put(update_report).delete(delete_report),
        )
        .route("/{id}/submit", post(submit_report))
        .route("/{id}/approve", post(approve_report))
        .route("/{id}/reject", post(reject_report))
        .route("/{id}/attachments", post(upload_attachments))
}
