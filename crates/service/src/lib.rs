//! Service layer providing the hero registry domain logic.
//! - Separates business rules (ID assignment, validation) from storage.
//! - File-backed persistence lives behind `storage` so it can be swapped
//!   for an embedded store without touching the registry contract.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod registry;
pub mod storage;
