//! People as seen by the core: directory rows and authenticated actors.

use serde::{Deserialize, Serialize};

/// Identifier issued by the identity collaborator.
pub type UserId = i64;

/// Organizational role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    /// Whether this role may assign tasks and meetings to others.
    pub fn can_assign_work(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

/// Already-authenticated caller of a core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    pub name: String,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            name: name.into(),
        }
    }
}

/// Directory row used for fan-out and team queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    /// Direct supervisor, if any.
    pub manager_id: Option<UserId>,
}

impl UserRecord {
    /// Projects the directory row into an actor handle.
    pub fn as_actor(&self) -> Actor {
        Actor::new(self.id, self.role, self.name.clone())
    }
}
