pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::{InMemoryRoleStore, RoleSeed};
pub use postgres::{PermissionTables, PostgresRoleStore};
pub use traits::{RoleStore, StorageError};
