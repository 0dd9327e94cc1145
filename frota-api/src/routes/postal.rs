/// Postal code autofill
///
/// ```text
/// GET /v1/postal-codes/30140-071
/// ```
///
/// Always answers 200: an unknown code or an unreachable service is reported
/// as a notice so the form can keep going with manual entry.
///
/// ```json
/// {
///   "status": "filled",
///   "notice": null,
///   "address": { "postal_code": "30140071", "state": "MG", "city": "Belo Horizonte", ... }
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use frota_shared::address::AddressFields;
use frota_shared::postal::{autofill, AutofillOutcome};
use frota_shared::validation::digits_only;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PostalLookupResponse {
    #[serde(flatten)]
    pub outcome: AutofillOutcome,

    /// Message to show next to the postal code input
    pub notice: Option<String>,

    pub address: AddressFields,
}

pub async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<PostalLookupResponse>> {
    let mut address = AddressFields {
        postal_code: digits_only(&code),
        ..Default::default()
    };

    let outcome = autofill(&state.postal, &mut address).await;

    Ok(Json(PostalLookupResponse {
        notice: outcome.notice(),
        outcome,
        address,
    }))
}
