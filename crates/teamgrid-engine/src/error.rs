//! Engine failure taxonomy

use thiserror::Error;
use uuid::Uuid;

/// Typed failures surfaced by the engine's actions and queries.
///
/// Conflict and not-found variants are detected before any row is
/// written; a failed action never leaves partial state behind. Store
/// errors are wrapped transparently and always abort the transaction.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Team {0} not found")]
    TeamNotFound(Uuid),

    #[error("Resource {0} not found")]
    ResourceNotFound(Uuid),

    #[error("User {user_id} has no direct membership in team {team_id}")]
    MembershipNotFound { team_id: Uuid, user_id: Uuid },

    #[error("User {manager_id} does not manage user {user_id}")]
    RelationshipNotFound { user_id: Uuid, manager_id: Uuid },

    #[error("Resource {resource_id} is not assigned to team {team_id}")]
    AssignmentNotFound { team_id: Uuid, resource_id: Uuid },

    #[error("User {user_id} is already a member of team {team_id}")]
    DuplicateMembership { team_id: Uuid, user_id: Uuid },

    #[error("User {manager_id} already manages user {user_id}")]
    DuplicateRelationship { user_id: Uuid, manager_id: Uuid },

    #[error("Resource {resource_id} is already assigned to team {team_id}")]
    DuplicateAssignment { team_id: Uuid, resource_id: Uuid },

    #[error("Users cannot manage themselves")]
    SelfManagement(Uuid),

    #[error("Making {manager_id} a manager of {user_id} would create a circular management relationship")]
    CircularManagement { user_id: Uuid, manager_id: Uuid },

    #[error("Management chain above user {manager_id} already reaches the depth limit ({max_depth})")]
    DepthExceeded { manager_id: Uuid, max_depth: usize },

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}
