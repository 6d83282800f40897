/// Audit trail endpoint
///
/// # Endpoints
///
/// - `GET /v1/activity` - List activity rows, newest first, up to 100

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use sitedesk_shared::{
    auth::middleware::AuthContext,
    models::activity_log::{ActivityFilter, ActivityLog, ActivityView, EntityKind},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Activity list query parameters
#[derive(Debug, Deserialize)]
pub struct ListActivityQuery {
    /// Filter by entity kind
    pub entity_type: Option<EntityKind>,

    /// Filter by entity id
    pub entity_id: Option<Uuid>,
}

/// Activity list response
#[derive(Debug, Serialize)]
pub struct ListActivityResponse {
    pub activities: Vec<ActivityView>,
}

/// List activity rows
///
/// Returns the most recent entries matching the filter, each with the
/// acting user's public identity resolved.
///
/// # Endpoint
///
/// ```text
/// GET /v1/activity?entity_type=task&entity_id=<uuid>
/// Authorization: Bearer <token>
/// ```
pub async fn list_activity(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(query): Query<ListActivityQuery>,
) -> ApiResult<Json<ListActivityResponse>> {
    let activities = ActivityLog::list(
        &state.db,
        ActivityFilter {
            entity_type: query.entity_type,
            entity_id: query.entity_id,
        },
    )
    .await?;

    Ok(Json(ListActivityResponse { activities }))
}
