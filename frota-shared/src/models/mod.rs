/// Table models for Frota
///
/// Each model wraps one table of the record store and exposes its
/// operations as associated async functions over `&dyn TableStore`.
///
/// # Models
///
/// - `state`, `city`, `neighborhood`, `street`: shared address reference data
/// - `driver`, `vehicle`, `client`: company-owned entities
/// - `address`: driver and client address rows
/// - `odometer`, `checklist`: vehicle operation records
/// - `document`: uploaded document references
///
/// # Example
///
/// ```no_run
/// use frota_shared::models::state::State;
/// use frota_shared::store::{RestStore, StoreConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RestStore::new(StoreConfig::from_env()?)?;
/// if let Some(sp) = State::find_by_abbreviation(&store, "sp").await? {
///     println!("{} -> {}", sp.abbreviation, sp.id);
/// }
/// # Ok(())
/// # }
/// ```

pub mod address;
pub mod checklist;
pub mod city;
pub mod client;
pub mod document;
pub mod driver;
pub mod neighborhood;
pub mod odometer;
pub mod state;
pub mod street;
pub mod vehicle;
