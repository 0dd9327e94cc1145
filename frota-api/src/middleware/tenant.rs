/// Tenant resolution middleware
///
/// Every `/v1` route runs inside one company. The company comes from the
/// `X-Company-Id` header and is handed to handlers as a `TenantContext`
/// request extension.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use frota_api::middleware::tenant::tenant_layer;
/// use frota_shared::tenant::TenantContext;
///
/// async fn whoami(Extension(ctx): Extension<TenantContext>) -> String {
///     ctx.company_id.to_string()
/// }
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(tenant_layer));
/// ```

use crate::error::ApiError;
use axum::{extract::Request, middleware::Next, response::Response};
use frota_shared::tenant::TenantContext;

/// Header carrying the company id
pub const COMPANY_HEADER: &str = "x-company-id";

/// Rejects requests without a positive numeric `X-Company-Id`
pub async fn tenant_layer(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let raw = req
        .headers()
        .get(COMPANY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-Company-Id header".to_string()))?;

    let company_id = raw
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::Unauthorized(format!("Invalid company id: {}", raw)))?;

    tracing::debug!(company_id, "Tenant resolved");
    req.extensions_mut().insert(TenantContext::new(company_id));

    Ok(next.run(req).await)
}
