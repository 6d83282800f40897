/// Procurement list endpoints
///
/// Any authenticated user can record and edit materials; deleting is
/// admin-only. Status advances (needed → ordered → arrived) are ordinary
/// updates with no transition guard.
///
/// # Endpoints
///
/// - `GET    /v1/materials` - List materials (optional status filter)
/// - `GET    /v1/materials/:id` - Material with its activity trail
/// - `POST   /v1/materials` - Create material
/// - `PUT    /v1/materials/:id` - Update material
/// - `DELETE /v1/materials/:id` - Delete material (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sitedesk_shared::{
    audit,
    auth::{authorization::require_admin, middleware::AuthContext},
    models::{
        activity_log::{ActivityAction, ActivityFilter, ActivityLog, ActivityView, ChangeSet, EntityKind},
        material::{CreateMaterial, Material, MaterialPatch, MaterialStatus, MaterialView},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Material list query parameters
#[derive(Debug, Deserialize)]
pub struct ListMaterialsQuery {
    /// Filter by status
    pub status: Option<MaterialStatus>,
}

/// Create material request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(range(min = 0.0, message = "Quantity must be non-negative"))]
    pub quantity: f64,

    /// Unit of measure; defaults to "piece"
    pub unit: Option<String>,

    pub notes: Option<String>,
}

/// Update material request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMaterialRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0.0, message = "Quantity must be non-negative"))]
    pub quantity: Option<f64>,

    pub unit: Option<String>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub notes: Option<Option<String>>,

    pub status: Option<MaterialStatus>,
}

/// Single-material response
#[derive(Debug, Serialize)]
pub struct MaterialResponse {
    pub material: MaterialView,
}

/// Material list response
#[derive(Debug, Serialize)]
pub struct ListMaterialsResponse {
    pub materials: Vec<MaterialView>,
}

/// Material with its audit trail
#[derive(Debug, Serialize)]
pub struct MaterialDetailResponse {
    pub material: MaterialView,
    pub activity: Vec<ActivityView>,
}

/// Deletion response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Fetches the resolved view of a material that is known to exist
async fn material_view(state: &AppState, id: Uuid) -> ApiResult<MaterialView> {
    Material::find_view_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))
}

/// List materials
///
/// # Endpoint
///
/// ```text
/// GET /v1/materials?status=needed
/// Authorization: Bearer <token>
/// ```
pub async fn list_materials(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(query): Query<ListMaterialsQuery>,
) -> ApiResult<Json<ListMaterialsResponse>> {
    let materials = Material::list(&state.db, query.status).await?;

    Ok(Json(ListMaterialsResponse { materials }))
}

/// Get a single material with its activity trail
///
/// # Errors
///
/// - `404 Not Found`: Material does not exist
pub async fn get_material(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MaterialDetailResponse>> {
    let material = material_view(&state, id).await?;

    let activity = ActivityLog::list(
        &state.db,
        ActivityFilter {
            entity_type: Some(EntityKind::Material),
            entity_id: Some(id),
        },
    )
    .await?;

    Ok(Json(MaterialDetailResponse { material, activity }))
}

/// Create material
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_material(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateMaterialRequest>,
) -> ApiResult<(StatusCode, Json<MaterialResponse>)> {
    req.validate()?;

    let material = Material::create(
        &state.db,
        CreateMaterial {
            name: req.name,
            quantity: req.quantity,
            unit: req.unit,
            notes: req.notes,
            created_by: auth.user_id,
        },
    )
    .await?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Material,
        material.id,
        ActivityAction::Created,
        None,
    )
    .await;

    let material = material_view(&state, material.id).await?;

    Ok((StatusCode::CREATED, Json(MaterialResponse { material })))
}

/// Update material
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Material does not exist
pub async fn update_material(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMaterialRequest>,
) -> ApiResult<Json<MaterialResponse>> {
    req.validate()?;

    let old = Material::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    let patch = MaterialPatch {
        name: req.name,
        quantity: req.quantity,
        unit: req.unit,
        notes: req.notes,
        status: req.status,
    };

    let updated = Material::update(&state.db, id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Material,
        id,
        ActivityAction::Updated,
        Some(ChangeSet::new(
            audit::snapshot(&old),
            audit::snapshot(&updated),
        )),
    )
    .await;

    let material = material_view(&state, id).await?;

    Ok(Json(MaterialResponse { material }))
}

/// Delete material (admin only)
///
/// The activity row is written before the row is removed.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: Material does not exist
pub async fn delete_material(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    require_admin(&auth)?;

    let material = Material::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Material,
        material.id,
        ActivityAction::Deleted,
        None,
    )
    .await;

    Material::delete(&state.db, id).await?;

    Ok(Json(SuccessResponse { success: true }))
}
