//! Access query layer: derived read-only views
//!
//! Thin joins over `team_members` and `team_resources`, computed fresh
//! from current rows on every call. No caching, no state of its own.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use teamgrid_db::entities::{team_member, team_resource};

/// Membership rows of a team, direct and manager-derived, in join order.
pub async fn members_of<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
) -> Result<Vec<team_member::Model>, DbErr> {
    team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_id))
        .order_by_asc(team_member::Column::JoinedAt)
        .order_by_asc(team_member::Column::UserId)
        .all(conn)
        .await
}

/// A user's membership rows across all teams ("which teams, and why").
pub async fn teams_of<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<Vec<team_member::Model>, DbErr> {
    team_member::Entity::find()
        .filter(team_member::Column::UserId.eq(user_id))
        .order_by_asc(team_member::Column::TeamId)
        .all(conn)
        .await
}

/// Teams a resource is currently assigned to.
pub async fn teams_holding<C: ConnectionTrait>(
    conn: &C,
    resource_id: Uuid,
) -> Result<Vec<team_resource::Model>, DbErr> {
    team_resource::Entity::find()
        .filter(team_resource::Column::ResourceId.eq(resource_id))
        .order_by_asc(team_resource::Column::TeamId)
        .all(conn)
        .await
}

/// Everyone who can see a resource, one row per (team, user) membership
/// that grants the visibility. A user in several assigned teams appears
/// once per team; callers deduplicate when they only need the user set.
pub async fn accessors_of<C: ConnectionTrait>(
    conn: &C,
    resource_id: Uuid,
) -> Result<Vec<team_member::Model>, DbErr> {
    let mut accessors = Vec::new();
    for assignment in teams_holding(conn, resource_id).await? {
        accessors.extend(members_of(conn, assignment.team_id).await?);
    }

    Ok(accessors)
}

/// Does `user_id` see `resource_id` through some team other than
/// `excluded_team`? Used to report retained visibility when a resource
/// is unassigned from one team.
pub async fn retains_access_via_other_team<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    resource_id: Uuid,
    excluded_team: Uuid,
) -> Result<Option<Uuid>, DbErr> {
    for assignment in teams_holding(conn, resource_id).await? {
        if assignment.team_id == excluded_team {
            continue;
        }
        let membership = team_member::Entity::find_by_id((assignment.team_id, user_id))
            .one(conn)
            .await?;
        if membership.is_some() {
            return Ok(Some(assignment.team_id));
        }
    }

    Ok(None)
}
