/// Tenant (company) context
///
/// Every read and write on a company-owned table is scoped by the active
/// company. The context is passed explicitly to each query function rather
/// than kept as ambient state.
///
/// Reference tables (states, cities, neighborhoods, streets) are shared by
/// all companies and are never scoped.

use crate::store::{Query, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column holding the owning company on tenant-scoped tables
pub const TENANT_COLUMN: &str = "company_id";

/// Active company for a request or session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    /// Company identifier
    pub company_id: i64,
}

impl TenantContext {
    /// Creates a context for `company_id`
    pub fn new(company_id: i64) -> Self {
        TenantContext { company_id }
    }

    /// Restricts a query to rows of this company
    pub fn scope(&self, query: Query) -> Query {
        query.eq(TENANT_COLUMN, self.company_id)
    }

    /// Starts a scoped query on `table`
    pub fn query(&self, table: &str) -> Query {
        self.scope(Query::table(table))
    }

    /// Stamps the company id on a row about to be created
    pub fn stamp(&self, mut row: Row) -> Row {
        row.insert(TENANT_COLUMN.to_string(), Value::from(self.company_id));
        row
    }
}
