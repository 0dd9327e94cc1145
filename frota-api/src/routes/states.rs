/// State reference list
///
/// ```text
/// GET /v1/states
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use frota_shared::models::state::State as FederativeUnit;

/// Lists all states ordered by abbreviation
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<FederativeUnit>>> {
    let states = FederativeUnit::list(state.store.as_ref()).await?;
    Ok(Json(states))
}
