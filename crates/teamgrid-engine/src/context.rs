//! Typed lookup step run at the start of every action
//!
//! Each action resolves the entities it touches into a context struct
//! before doing anything else, so the mutation code works with full
//! models instead of bare identifiers and not-found failures surface
//! first.

use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use teamgrid_db::entities::{resource, team, user};

use crate::error::EngineError;

/// User and team for the membership actions.
pub(crate) struct MembershipContext {
    pub user: user::Model,
    pub team: team::Model,
}

/// Subordinate and manager for the hierarchy actions.
pub(crate) struct HierarchyContext {
    pub user: user::Model,
    pub manager: user::Model,
}

/// Team and resource for the assignment actions.
pub(crate) struct AssignmentContext {
    pub team: team::Model,
    pub resource: resource::Model,
}

pub(crate) async fn fetch_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<user::Model, EngineError> {
    user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(EngineError::UserNotFound(user_id))
}

pub(crate) async fn fetch_team<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
) -> Result<team::Model, EngineError> {
    team::Entity::find_by_id(team_id)
        .one(conn)
        .await?
        .ok_or(EngineError::TeamNotFound(team_id))
}

pub(crate) async fn fetch_resource<C: ConnectionTrait>(
    conn: &C,
    resource_id: Uuid,
) -> Result<resource::Model, EngineError> {
    resource::Entity::find_by_id(resource_id)
        .one(conn)
        .await?
        .ok_or(EngineError::ResourceNotFound(resource_id))
}

pub(crate) async fn membership<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    team_id: Uuid,
) -> Result<MembershipContext, EngineError> {
    Ok(MembershipContext {
        user: fetch_user(conn, user_id).await?,
        team: fetch_team(conn, team_id).await?,
    })
}

pub(crate) async fn hierarchy<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    manager_id: Uuid,
) -> Result<HierarchyContext, EngineError> {
    Ok(HierarchyContext {
        user: fetch_user(conn, user_id).await?,
        manager: fetch_user(conn, manager_id).await?,
    })
}

pub(crate) async fn assignment<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
    resource_id: Uuid,
) -> Result<AssignmentContext, EngineError> {
    Ok(AssignmentContext {
        team: fetch_team(conn, team_id).await?,
        resource: fetch_resource(conn, resource_id).await?,
    })
}
