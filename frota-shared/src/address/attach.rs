/// Owner address attachment
///
/// Binds a resolved street to a driver or client. Driver address rows are
/// (re-)marked active on every write; client rows carry no flag.

use super::{AddressFields, AddressResolver, ResolutionError};
use crate::models::address::{AddressOwner, OwnerAddress};
use crate::store::{StoreError, TableStore};
use tracing::{debug, info};

/// Inserts an address row for `owner`, returning its id
pub async fn attach_address(
    store: &dyn TableStore,
    owner: &AddressOwner,
    street_id: i64,
    house_number: Option<&str>,
    complement: Option<&str>,
) -> Result<i64, ResolutionError> {
    let address = OwnerAddress::insert(store, owner, street_id, house_number, complement)
        .await
        .map_err(ResolutionError::Attach)?;

    info!(
        owner = ?owner.kind,
        owner_id = owner.id,
        address_id = address.id,
        street_id,
        "Address attached"
    );
    Ok(address.id)
}

/// Rewrites the owner's existing address row in place
///
/// The row must belong to `owner`; otherwise nothing is written and
/// `ResolutionError::Attach(StoreError::NotFound)` is returned.
pub async fn update_address(
    store: &dyn TableStore,
    owner: &AddressOwner,
    address_id: i64,
    street_id: i64,
    house_number: Option<&str>,
    complement: Option<&str>,
) -> Result<i64, ResolutionError> {
    let updated = OwnerAddress::update(store, owner, address_id, street_id, house_number, complement)
        .await
        .map_err(ResolutionError::Attach)?;

    match updated {
        Some(address) => {
            debug!(address_id = address.id, street_id, "Address updated");
            Ok(address.id)
        }
        None => Err(ResolutionError::Attach(StoreError::NotFound(format!(
            "{} {}",
            owner.kind.table(),
            address_id
        )))),
    }
}

/// Resolves `fields` and writes them as the owner's current address
///
/// Updates the current row when one exists, inserts otherwise.
pub async fn save_address(
    store: &dyn TableStore,
    owner: &AddressOwner,
    fields: &AddressFields,
) -> Result<i64, ResolutionError> {
    let street_id = AddressResolver::new(store).resolve(fields).await?;

    let current = OwnerAddress::current(store, owner)
        .await
        .map_err(|source| ResolutionError::Lookup {
            entity: "address",
            source,
        })?;

    match current {
        Some(existing) => {
            update_address(
                store,
                owner,
                existing.id,
                street_id,
                fields.house_number(),
                fields.complement(),
            )
            .await
        }
        None => {
            attach_address(store, owner, street_id, fields.house_number(), fields.complement())
                .await
        }
    }
}
