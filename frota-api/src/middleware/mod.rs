/// Middleware modules for the API server
///
/// - `tenant`: resolves the company of each `/v1` request

pub mod tenant;
