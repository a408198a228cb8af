//! Membership propagation: computing and applying derived-access deltas
//!
//! Both directions of propagation run through the same desired-set
//! computation: a bounded breadth-first walk upward from a team's direct
//! members. Additive actions insert whatever is missing; removal actions
//! reconcile the stored rows against the recomputed set, deleting rows
//! with no remaining anchoring path and re-anchoring rows whose
//! `granted_via` link went away.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use teamgrid_db::entities::team_member::{self, AccessType};

use crate::error::EngineError;
use crate::hierarchy::ManagerGraph;

/// Membership rows of one team, split for propagation.
pub(crate) struct TeamState {
    /// Direct member ids in join order
    pub direct: Vec<Uuid>,
    /// Every membership row keyed by user id
    pub rows: HashMap<Uuid, team_member::Model>,
    /// User ids of manager-type rows in join order
    pub manager_order: Vec<Uuid>,
}

pub(crate) async fn load_team<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
) -> Result<TeamState, DbErr> {
    let models = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_id))
        .order_by_asc(team_member::Column::JoinedAt)
        .order_by_asc(team_member::Column::UserId)
        .all(conn)
        .await?;

    let mut direct = Vec::new();
    let mut manager_order = Vec::new();
    let mut rows = HashMap::with_capacity(models.len());
    for model in models {
        match model.access_type {
            AccessType::Direct => direct.push(model.user_id),
            AccessType::Manager => manager_order.push(model.user_id),
        }
        rows.insert(model.user_id, model);
    }

    Ok(TeamState {
        direct,
        rows,
        manager_order,
    })
}

/// The manager rows a team is entitled to, given its direct members and
/// the current manager graph: every user within `max_depth` hops above a
/// direct member, paired with the immediate downstream link it was
/// reached through. Breadth-first from all direct members at once, so a
/// manager reachable along several chains is attributed to the shortest
/// one. Direct members never appear in the result; their rows already
/// outrank any derived grant.
pub(crate) fn desired_grants(
    direct: &[Uuid],
    graph: &ManagerGraph,
    max_depth: usize,
) -> Vec<(Uuid, Uuid)> {
    let mut grants = Vec::new();
    let mut seen: HashSet<Uuid> = direct.iter().copied().collect();
    let mut queue: VecDeque<(Uuid, usize)> = direct.iter().map(|&d| (d, 0)).collect();

    while let Some((current, depth)) = queue.pop_front() {
        if depth == max_depth {
            continue;
        }
        for &manager_id in graph.direct_managers(current) {
            if seen.insert(manager_id) {
                grants.push((manager_id, current));
                queue.push_back((manager_id, depth + 1));
            }
        }
    }

    grants
}

async fn insert_manager_row<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
    manager_id: Uuid,
    via: Uuid,
) -> Result<(), DbErr> {
    team_member::ActiveModel {
        team_id: Set(team_id),
        user_id: Set(manager_id),
        access_type: Set(AccessType::Manager),
        granted_via: Set(Some(via)),
        joined_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// Additive propagation: insert the manager rows the team is entitled to
/// but does not hold yet. Existing rows, direct or manager, are left
/// untouched.
pub(crate) async fn grant_missing<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
    graph: &ManagerGraph,
    max_depth: usize,
    log: &mut Vec<String>,
) -> Result<(), EngineError> {
    let state = load_team(conn, team_id).await?;
    let desired = desired_grants(&state.direct, graph, max_depth);

    for (manager_id, via) in desired {
        if state.rows.contains_key(&manager_id) {
            continue;
        }
        insert_manager_row(conn, team_id, manager_id, via).await?;
        debug!(%team_id, %manager_id, %via, "granted manager access");
        log.push(format!(
            "granted user {manager_id} manager access to team {team_id} via user {via}"
        ));
    }

    Ok(())
}

/// Full propagation: reconcile stored manager rows against the
/// recomputed desired set.
///
/// Rows outside the desired set lose their access. Rows inside it keep
/// their `granted_via` anchor when the recorded link still holds (the
/// edge exists and the link user remains a member); otherwise the row is
/// re-anchored to the recomputed link. Entitled rows that are missing
/// are inserted, so a removed direct member who still manages another
/// direct member retains derived access.
pub(crate) async fn reconcile<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
    graph: &ManagerGraph,
    max_depth: usize,
    log: &mut Vec<String>,
) -> Result<(), EngineError> {
    let state = load_team(conn, team_id).await?;
    let desired = desired_grants(&state.direct, graph, max_depth);
    let desired_via: HashMap<Uuid, Uuid> = desired.iter().copied().collect();

    let mut members: HashSet<Uuid> = state.direct.iter().copied().collect();
    members.extend(desired_via.keys().copied());

    for manager_id in &state.manager_order {
        let row = &state.rows[manager_id];
        let Some(&recomputed_via) = desired_via.get(manager_id) else {
            row.clone().delete(conn).await?;
            debug!(%team_id, %manager_id, "revoked manager access");
            log.push(format!(
                "revoked manager access for user {manager_id} on team {team_id} (no remaining path)"
            ));
            continue;
        };

        let anchor_holds = row.granted_via.is_some_and(|via| {
            members.contains(&via) && graph.direct_managers(via).contains(manager_id)
        });
        if anchor_holds {
            continue;
        }

        let mut active: team_member::ActiveModel = row.clone().into();
        active.granted_via = Set(Some(recomputed_via));
        active.update(conn).await?;
        debug!(%team_id, %manager_id, via = %recomputed_via, "re-anchored manager access");
        log.push(format!(
            "re-anchored manager access for user {manager_id} on team {team_id} via user {recomputed_via}"
        ));
    }

    for (manager_id, via) in desired {
        if state.rows.contains_key(&manager_id) {
            continue;
        }
        insert_manager_row(conn, team_id, manager_id, via).await?;
        debug!(%team_id, %manager_id, %via, "granted manager access");
        log.push(format!(
            "granted user {manager_id} manager access to team {team_id} via user {via}"
        ));
    }

    Ok(())
}
