//! CRUD service: authorization-checked pass-through to a data-access capability.

mod crud;
pub use crud::{merge_patch, CrudService, EntityService};
