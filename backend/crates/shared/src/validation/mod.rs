//! Uniqueness validation against persisted data
//!
//! ## Modules
//! - `value` - field values and entity references
//! - `metadata` - which fields an entity persists and how it is identified
//! - `candidate` - field access on the object being checked
//! - `gateway` - the storage query seam ([`ObjectGateway`])
//! - `unique` - the validator itself
//! - `format` - rendering of offending values
//!
//! ## Examples
//! ```rust
//! use kernel::validation::{UniqueConstraint, MatchStrategy};
//!
//! let constraint = UniqueConstraint::new(["email"])
//!     .unwrap()
//!     .strategy(MatchStrategy::Bounded);
//! assert_eq!(constraint.path(), "email");
//! ```

pub mod candidate;
pub mod format;
pub mod gateway;
pub mod metadata;
pub mod unique;
pub mod value;

pub use candidate::Candidate;
pub use gateway::{Criteria, LocalObjectGateway, ObjectGateway, Record};
pub use metadata::{EntityCatalog, EntityMetadata, FieldKind, FieldSpec};
pub use unique::{
    ConfigurationError, DEFAULT_MESSAGE, FieldMapping, MatchStrategy, NOT_UNIQUE_ERROR,
    UniqueConstraint, UniqueEntityValidator, UniqueError, ValidationOutcome, Violation,
};
pub use value::{CustomValue, EntityRef, FieldValue};
