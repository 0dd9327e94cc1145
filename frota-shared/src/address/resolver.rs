/// Address chain resolver
///
/// Turns free-text address parts into a street id, creating missing
/// reference rows along the way.
///
/// # Algorithm
///
/// ```text
/// resolve_or_create_street(state, city, neighborhood, street, postal_code)
///   1. state_id        <- states by abbreviation or id   (must exist)
///   2. city_id         <- find (name, state_id)          or create
///   3. neighborhood_id <- find (name, city_id)           or create
///                         (a blank name is the city's unnamed neighborhood)
///   4. street_id       <- find (name, cep, neighborhood) or create
/// ```
///
/// Each find-or-create is a read followed by a conditional write and is not
/// transactional. "No rows" on a read is not an error; any other read error
/// aborts with `ResolutionError::Lookup`. A failed write aborts with
/// `ResolutionError::Creation`; writes are not retried.
///
/// Concurrent resolvers may both miss on the read and both insert. When
/// the store enforces the natural key, the losing insert gets a unique
/// violation; the resolver then re-reads once and returns the winner's row.
/// Without the constraint both rows are kept.
///
/// # Example
///
/// ```no_run
/// use frota_shared::address::{AddressResolver, StateRef};
/// use frota_shared::store::InMemoryStore;
///
/// # async fn example() -> Result<(), frota_shared::address::ResolutionError> {
/// let store = InMemoryStore::with_default_schema();
/// let resolver = AddressResolver::new(&store);
///
/// let street_id = resolver
///     .resolve_or_create_street(
///         &StateRef::parse("SP"),
///         "São Paulo",
///         "Bela Vista",
///         "Avenida Paulista",
///         "01310100",
///     )
///     .await?;
/// println!("street {}", street_id);
/// # Ok(())
/// # }
/// ```

use super::{AddressFields, ResolutionError, StateRef};
use crate::models::city::{City, CreateCity};
use crate::models::neighborhood::{CreateNeighborhood, Neighborhood};
use crate::models::state::State;
use crate::models::street::{CreateStreet, Street};
use crate::store::{StoreResult, TableStore};
use crate::validation::digits_only;
use std::future::Future;
use tracing::{debug, info};

/// Finds or creates the normalised address chain
#[derive(Clone, Copy)]
pub struct AddressResolver<'a> {
    store: &'a dyn TableStore,
}

impl<'a> AddressResolver<'a> {
    /// Creates a resolver over `store`
    pub fn new(store: &'a dyn TableStore) -> Self {
        AddressResolver { store }
    }

    /// Resolves a form address to a street id
    pub async fn resolve(&self, fields: &AddressFields) -> Result<i64, ResolutionError> {
        self.resolve_or_create_street(
            &StateRef::parse(&fields.state),
            &fields.city,
            &fields.neighborhood,
            &fields.street,
            &fields.postal_code,
        )
        .await
    }

    /// Resolves (creating as needed) the street for the given address parts
    ///
    /// # Errors
    ///
    /// - `Incomplete` if the state, city or street is blank
    /// - `InvalidState` if the state does not exist
    /// - `Lookup` / `Creation` on store failures
    pub async fn resolve_or_create_street(
        &self,
        state: &StateRef,
        city: &str,
        neighborhood: &str,
        street: &str,
        postal_code: &str,
    ) -> Result<i64, ResolutionError> {
        let city = required("city", city)?;
        let neighborhood = neighborhood.trim();
        let street = required("street", street)?;
        let postal_code = digits_only(postal_code);

        let state_id = self.resolve_state(state).await?;
        let city_id = self.find_or_create_city(city, state_id).await?;
        let neighborhood_id = self.find_or_create_neighborhood(neighborhood, city_id).await?;
        let street_id = self
            .find_or_create_street(street, &postal_code, neighborhood_id)
            .await?;

        debug!(state_id, city_id, neighborhood_id, street_id, "Address resolved");
        Ok(street_id)
    }

    async fn resolve_state(&self, state: &StateRef) -> Result<i64, ResolutionError> {
        let found = match state {
            StateRef::Abbreviation(abbr) if abbr.is_empty() => {
                return Err(ResolutionError::Incomplete("state"))
            }
            StateRef::Abbreviation(abbr) => State::find_by_abbreviation(self.store, abbr).await,
            StateRef::Id(id) => State::find_by_id(self.store, *id).await,
        }
        .map_err(|source| ResolutionError::Lookup {
            entity: "state",
            source,
        })?;

        found
            .map(|s| s.id)
            .ok_or_else(|| ResolutionError::InvalidState(state.to_string()))
    }

    async fn find_or_create_city(&self, name: &str, state_id: i64) -> Result<i64, ResolutionError> {
        let store = self.store;
        find_or_create(
            "city",
            || async move { Ok(City::find(store, name, state_id).await?.map(|c| c.id)) },
            || async move {
                let data = CreateCity {
                    name: name.to_string(),
                    state_id,
                };
                Ok(City::create(store, data).await?.id)
            },
        )
        .await
    }

    async fn find_or_create_neighborhood(
        &self,
        name: &str,
        city_id: i64,
    ) -> Result<i64, ResolutionError> {
        let store = self.store;
        find_or_create(
            "neighborhood",
            || async move { Ok(Neighborhood::find(store, name, city_id).await?.map(|n| n.id)) },
            || async move {
                let data = CreateNeighborhood {
                    name: name.to_string(),
                    city_id,
                };
                Ok(Neighborhood::create(store, data).await?.id)
            },
        )
        .await
    }

    async fn find_or_create_street(
        &self,
        name: &str,
        postal_code: &str,
        neighborhood_id: i64,
    ) -> Result<i64, ResolutionError> {
        let store = self.store;
        find_or_create(
            "street",
            || async move {
                Ok(Street::find(store, name, postal_code, neighborhood_id)
                    .await?
                    .map(|s| s.id))
            },
            || async move {
                let data = CreateStreet {
                    name: name.to_string(),
                    postal_code: postal_code.to_string(),
                    neighborhood_id,
                };
                Ok(Street::create(store, data).await?.id)
            },
        )
        .await
    }
}

fn required<'s>(part: &'static str, value: &'s str) -> Result<&'s str, ResolutionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ResolutionError::Incomplete(part));
    }
    Ok(trimmed)
}

/// Read, then conditionally write; a unique violation on the write is
/// settled by one more read.
async fn find_or_create<F, FFut, C, CFut>(
    entity: &'static str,
    find: F,
    create: C,
) -> Result<i64, ResolutionError>
where
    F: Fn() -> FFut,
    FFut: Future<Output = StoreResult<Option<i64>>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = StoreResult<i64>>,
{
    let lookup = |source| ResolutionError::Lookup { entity, source };

    if let Some(id) = find().await.map_err(lookup)? {
        return Ok(id);
    }

    match create().await {
        Ok(id) => {
            info!(entity, id, "Created address reference row");
            Ok(id)
        }
        Err(err) if err.is_conflict() => {
            debug!(entity, "Lost creation race, re-reading natural key");
            find()
                .await
                .map_err(lookup)?
                .ok_or(ResolutionError::Creation { entity, source: err })
        }
        Err(source) => Err(ResolutionError::Creation { entity, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreError, StoreOp};
    use serde_json::json;

    async fn store_with_sp() -> InMemoryStore {
        let store = InMemoryStore::with_default_schema();
        let row = json!({"abbreviation": "SP", "name": "São Paulo"});
        store
            .insert("states", row.as_object().cloned().unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_creates_full_chain() {
        let store = store_with_sp().await;
        let resolver = AddressResolver::new(&store);

        let id = resolver
            .resolve_or_create_street(&StateRef::parse("sp"), "Campinas", "Centro", "Rua A", "13010-000")
            .await
            .unwrap();

        assert_eq!(store.row_count("cities"), 1);
        assert_eq!(store.row_count("neighborhoods"), 1);
        assert_eq!(store.row_count("streets"), 1);
        assert_eq!(store.rows("streets")[0]["id"], id);
        assert_eq!(store.rows("streets")[0]["postal_code"], "13010000");
    }

    #[tokio::test]
    async fn test_resolve_by_state_id() {
        let store = store_with_sp().await;
        let resolver = AddressResolver::new(&store);

        assert!(resolver
            .resolve_or_create_street(&StateRef::Id(1), "Campinas", "Centro", "Rua A", "")
            .await
            .is_ok());
        assert!(matches!(
            resolver
                .resolve_or_create_street(&StateRef::Id(99), "Campinas", "Centro", "Rua A", "")
                .await,
            Err(ResolutionError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_parts_are_incomplete() {
        let store = store_with_sp().await;
        let resolver = AddressResolver::new(&store);

        let err = resolver
            .resolve_or_create_street(&StateRef::parse("SP"), "Campinas", "Centro", " ", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Incomplete("street")));
        assert_eq!(store.row_count("cities"), 0);

        let err = resolver
            .resolve_or_create_street(&StateRef::parse(""), "Campinas", "Centro", "Rua A", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Incomplete("state")));
    }

    #[tokio::test]
    async fn test_blank_neighborhood_uses_unnamed_row() {
        let store = store_with_sp().await;
        let resolver = AddressResolver::new(&store);

        let first = resolver
            .resolve_or_create_street(&StateRef::parse("SP"), "Socorro", " ", "Rua Principal", "13960-000")
            .await
            .unwrap();
        let second = resolver
            .resolve_or_create_street(&StateRef::parse("SP"), "Socorro", "", "Rua Principal", "13960000")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.row_count("neighborhoods"), 1);
        assert_eq!(store.rows("neighborhoods")[0]["name"], "");
        assert_eq!(store.row_count("streets"), 1);
    }

    #[tokio::test]
    async fn test_lookup_error_aborts_chain() {
        let store = store_with_sp().await;
        store.fail_next("neighborhoods", StoreOp::Select, StoreError::Transport("timeout".into()));

        let err = AddressResolver::new(&store)
            .resolve_or_create_street(&StateRef::parse("SP"), "Campinas", "Centro", "Rua A", "")
            .await
            .unwrap_err();

        assert!(matches!(err, ResolutionError::Lookup { entity: "neighborhood", .. }));
        assert_eq!(store.row_count("neighborhoods"), 0);
        assert_eq!(store.row_count("streets"), 0);
    }

    #[tokio::test]
    async fn test_creation_error_is_not_retried() {
        let store = store_with_sp().await;
        store.fail_next("streets", StoreOp::Insert, StoreError::Transport("reset".into()));

        let err = AddressResolver::new(&store)
            .resolve_or_create_street(&StateRef::parse("SP"), "Campinas", "Centro", "Rua A", "")
            .await
            .unwrap_err();

        assert!(matches!(err, ResolutionError::Creation { entity: "street", .. }));
        assert_eq!(store.call_count("streets", StoreOp::Insert), 1);
    }

    #[tokio::test]
    async fn test_conflict_on_create_rereads_once() {
        let reads = std::sync::atomic::AtomicUsize::new(0);

        // First read misses, the insert loses the race, the re-read sees the winner
        let id = find_or_create(
            "city",
            || {
                let n = reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async move { Ok((n > 0).then_some(42)) }
            },
            || async {
                Err(StoreError::Conflict {
                    table: "cities".into(),
                    message: "duplicate key".into(),
                })
            },
        )
        .await
        .unwrap();

        assert_eq!(id, 42);
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_conflict_without_winner_is_creation_error() {
        let err = find_or_create(
            "street",
            || async { Ok(None) },
            || async {
                Err(StoreError::Conflict {
                    table: "streets".into(),
                    message: "duplicate key".into(),
                })
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ResolutionError::Creation { entity: "street", .. }));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let store = store_with_sp().await;
        let resolver = AddressResolver::new(&store);
        let fields = AddressFields {
            state: "SP".to_string(),
            city: "Campinas".to_string(),
            neighborhood: "Centro".to_string(),
            street: " Rua A ".to_string(),
            ..Default::default()
        };

        let first = resolver.resolve(&fields).await.unwrap();
        let second = resolver.resolve(&fields).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.row_count("streets"), 1);
        assert_eq!(store.rows("streets")[0]["name"], "Rua A");
    }
}
