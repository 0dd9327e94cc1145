/// Client form flows
///
/// Clients accept a CPF or CNPJ. The address step is best-effort, as for
/// drivers.

use super::{clean, save_address_best_effort, RegistrationError, Saved};
use crate::address::AddressFields;
use crate::models::address::AddressOwner;
use crate::models::client::{Client, CreateClient, UpdateClient};
use crate::store::TableStore;
use crate::tenant::TenantContext;
use crate::validation::{require, validate_client_document};
use tracing::info;

/// Creates a client and, if filled in, its address
pub async fn create_client(
    store: &dyn TableStore,
    ctx: &TenantContext,
    mut data: CreateClient,
    address: Option<&AddressFields>,
) -> Result<Saved<Client>, RegistrationError> {
    data.name = require("name", &data.name)?;
    data.document = validate_client_document(&data.document)?;
    data.phone = clean(data.phone);
    data.email = clean(data.email);
    let document = data.document.clone();

    let client = Client::create(store, ctx, data)
        .await
        .map_err(RegistrationError::document(&document))?;
    info!(company_id = ctx.company_id, client_id = client.id, "Client created");

    let address = save_address_best_effort(store, &AddressOwner::client(client.id), address).await;
    Ok(Saved::new(client).with_address(address))
}

/// Updates a client and rewrites its current address
pub async fn update_client(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
    mut changes: UpdateClient,
    address: Option<&AddressFields>,
) -> Result<Saved<Client>, RegistrationError> {
    if let Some(name) = &changes.name {
        changes.name = Some(require("name", name)?);
    }
    if let Some(document) = &changes.document {
        changes.document = Some(validate_client_document(document)?);
    }
    let document = changes.document.clone().unwrap_or_default();

    let client = Client::update(store, ctx, id, changes)
        .await
        .map_err(RegistrationError::document(&document))?
        .ok_or_else(|| RegistrationError::not_found("client", id))?;

    let address = save_address_best_effort(store, &AddressOwner::client(client.id), address).await;
    Ok(Saved::new(client).with_address(address))
}

/// Loads a client of the company
pub async fn get_client(
    store: &dyn TableStore,
    ctx: &TenantContext,
    id: i64,
) -> Result<Client, RegistrationError> {
    Client::find_by_id(store, ctx, id)
        .await?
        .ok_or_else(|| RegistrationError::not_found("client", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_cnpj_accepted_and_address_saved() {
        let store = InMemoryStore::with_default_schema();
        store
            .insert(
                "states",
                json!({"abbreviation": "RS", "name": "Rio Grande do Sul"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        let data = CreateClient {
            name: "Transportes Sul".to_string(),
            document: "12.345.678/0001-90".to_string(),
            ..Default::default()
        };
        let address = AddressFields {
            state: "RS".to_string(),
            city: "Porto Alegre".to_string(),
            neighborhood: "Moinhos de Vento".to_string(),
            street: "Rua Padre Chagas".to_string(),
            ..Default::default()
        };

        let saved = create_client(&store, &TenantContext::new(2), data, Some(&address))
            .await
            .unwrap();

        assert_eq!(saved.entity.document, "12345678000190");
        assert!(saved.address_id.is_some());
        assert_eq!(store.rows("client_addresses")[0]["client_id"], saved.entity.id);
    }

    #[tokio::test]
    async fn test_thirteen_digit_document_rejected() {
        let store = InMemoryStore::with_default_schema();
        let data = CreateClient {
            name: "X".to_string(),
            document: "1234567890123".to_string(),
            ..Default::default()
        };

        let err = create_client(&store, &TenantContext::new(1), data, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Validation(_)));
    }
}
