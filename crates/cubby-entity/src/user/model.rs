//! User entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account. Accounts are managed by the authentication layer;
/// cubby only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Login name; also the home directory name.
    pub username: String,
    /// Contact address.
    pub email: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
}
