/// Address resolution and attachment
///
/// Addresses are normalised into a chain of shared reference rows:
///
/// ```text
/// state (pre-existing) -> city -> neighborhood -> street -> owner address
/// ```
///
/// - `resolver`: finds or creates the city/neighborhood/street chain and
///   returns the street id
/// - `attach`: binds a resolved street to a driver or client
///
/// Address attachment is always secondary to the owning entity: callers
/// report a `ResolutionError` as a warning and keep the entity.

pub mod attach;
pub mod resolver;

pub use attach::{attach_address, save_address, update_address};
pub use resolver::AddressResolver;

use crate::store::StoreError;
use serde::{Deserialize, Serialize};

/// Free-text address as typed into a form
///
/// All fields are plain strings so the postal autofill can clear them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressFields {
    pub postal_code: String,

    /// State abbreviation ("SP") or numeric state id
    pub state: String,

    pub city: String,
    pub neighborhood: String,
    pub street: String,
    pub house_number: String,
    pub complement: String,
}

impl AddressFields {
    /// Street, city and state are all filled in
    pub fn is_sufficient(&self) -> bool {
        !self.street.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.state.trim().is_empty()
    }

    /// Clears the fields fed by the postal lookup
    pub fn clear_lookup_fields(&mut self) {
        self.street.clear();
        self.neighborhood.clear();
        self.city.clear();
        self.state.clear();
    }

    pub(crate) fn house_number(&self) -> Option<&str> {
        non_blank(&self.house_number)
    }

    pub(crate) fn complement(&self) -> Option<&str> {
        non_blank(&self.complement)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Reference to a pre-existing state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRef {
    /// Two-letter abbreviation
    Abbreviation(String),

    /// Row id
    Id(i64),
}

impl StateRef {
    /// Reads a numeric id or an abbreviation
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<i64>() {
            Ok(id) => StateRef::Id(id),
            Err(_) => StateRef::Abbreviation(trimmed.to_uppercase()),
        }
    }
}

impl std::fmt::Display for StateRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateRef::Abbreviation(abbr) => write!(f, "{}", abbr),
            StateRef::Id(id) => write!(f, "#{}", id),
        }
    }
}

/// Address chain errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolutionError {
    /// A required address part is blank
    #[error("Address is incomplete: {0} is required")]
    Incomplete(&'static str),

    /// The state does not exist (states are never created)
    #[error("State not found: {0}")]
    InvalidState(String),

    /// A lookup failed for a reason other than "no rows"
    #[error("Failed to look up {entity}: {source}")]
    Lookup {
        entity: &'static str,
        #[source]
        source: StoreError,
    },

    /// Creating a reference row failed
    #[error("Failed to create {entity}: {source}")]
    Creation {
        entity: &'static str,
        #[source]
        source: StoreError,
    },

    /// Writing the owner's address row failed
    #[error("Failed to save address: {0}")]
    Attach(#[source] StoreError),
}
