//! The six access-propagation actions

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set, TransactionTrait};
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use teamgrid_db::entities::{
    team_member::{self, AccessType},
    team_resource, user_manager,
};

use crate::context;
use crate::error::EngineError;
use crate::hierarchy::ManagerGraph;
use crate::propagate;
use crate::query;

/// Hard policy ceiling on management-chain length considered during
/// propagation and enforced on assignment. Not a structural graph limit.
pub const MAX_MANAGER_DEPTH: usize = 3;

/// Engine tuning knobs.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Maximum manager hops considered during propagation
    pub max_manager_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_manager_depth: MAX_MANAGER_DEPTH,
        }
    }
}

/// The access-propagation engine.
///
/// Owns every write to `team_members` and `user_managers`. Each action
/// runs in one transaction: either the full invariant-preserving delta
/// applies, or none of it does. Mutating actions are serialized behind a
/// single async lock; org charts are small, and the lock keeps two
/// actions from interleaving their read and write phases.
pub struct AccessEngine {
    db: DatabaseConnection,
    config: EngineConfig,
    write_lock: Mutex<()>,
}

impl AccessEngine {
    /// Create an engine with the default depth policy.
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(db: DatabaseConnection, config: EngineConfig) -> Self {
        Self {
            db,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Action 1: add a user to a team as a direct member.
    ///
    /// Every manager in the user's bounded upward chain inherits
    /// manager-derived access unless already holding a row in the team.
    pub async fn add_user_to_team(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<Vec<String>, EngineError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ctx = context::membership(&txn, user_id, team_id).await?;
        if team_member::Entity::find_by_id((team_id, user_id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateMembership { team_id, user_id });
        }

        let mut log = Vec::new();

        team_member::ActiveModel {
            team_id: Set(team_id),
            user_id: Set(user_id),
            access_type: Set(AccessType::Direct),
            granted_via: Set(None),
            joined_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        log.push(format!(
            "added user {user_id} to team {team_id} as direct member"
        ));

        let graph = ManagerGraph::load(&txn).await?;
        propagate::grant_missing(&txn, team_id, &graph, self.config.max_manager_depth, &mut log)
            .await?;

        txn.commit().await?;
        info!(user = %ctx.user.name, team = %ctx.team.name, "added direct member");

        Ok(log)
    }

    /// Action 2: remove a user's direct membership.
    ///
    /// Manager-derived rows left without an anchoring path are revoked,
    /// cascading all the way up the chain; surviving rows whose recorded
    /// link went away are re-anchored to a remaining one.
    pub async fn remove_user_from_team(
        &self,
        user_id: Uuid,
        team_id: Uuid,
    ) -> Result<Vec<String>, EngineError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ctx = context::membership(&txn, user_id, team_id).await?;
        let row = team_member::Entity::find_by_id((team_id, user_id))
            .one(&txn)
            .await?
            .filter(|row| row.access_type == AccessType::Direct)
            .ok_or(EngineError::MembershipNotFound { team_id, user_id })?;

        let mut log = Vec::new();

        row.delete(&txn).await?;
        log.push(format!("removed user {user_id} from team {team_id}"));

        let graph = ManagerGraph::load(&txn).await?;
        propagate::reconcile(&txn, team_id, &graph, self.config.max_manager_depth, &mut log)
            .await?;

        txn.commit().await?;
        info!(user = %ctx.user.name, team = %ctx.team.name, "removed direct member");

        Ok(log)
    }

    /// Action 3: record that `manager_id` manages `user_id`.
    ///
    /// The manager, and transitively the manager's own chain, inherits
    /// access to every team the subordinate holds membership in, within
    /// the depth policy.
    pub async fn assign_manager(
        &self,
        user_id: Uuid,
        manager_id: Uuid,
    ) -> Result<Vec<String>, EngineError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ctx = context::hierarchy(&txn, user_id, manager_id).await?;
        if user_id == manager_id {
            return Err(EngineError::SelfManagement(user_id));
        }
        if user_manager::Entity::find_by_id((user_id, manager_id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateRelationship {
                user_id,
                manager_id,
            });
        }

        let graph = ManagerGraph::load(&txn).await?;
        if graph.would_create_cycle(user_id, manager_id) {
            return Err(EngineError::CircularManagement {
                user_id,
                manager_id,
            });
        }
        if graph.depth_of(manager_id) >= self.config.max_manager_depth {
            return Err(EngineError::DepthExceeded {
                manager_id,
                max_depth: self.config.max_manager_depth,
            });
        }

        let mut log = Vec::new();

        user_manager::ActiveModel {
            user_id: Set(user_id),
            manager_id: Set(manager_id),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        log.push(format!("user {manager_id} now manages user {user_id}"));

        // Reload so the propagation walk sees the new edge.
        let graph = ManagerGraph::load(&txn).await?;
        for team_id in self.teams_holding_member(&txn, user_id).await? {
            propagate::grant_missing(&txn, team_id, &graph, self.config.max_manager_depth, &mut log)
                .await?;
        }

        txn.commit().await?;
        info!(user = %ctx.user.name, manager = %ctx.manager.name, "assigned manager");

        Ok(log)
    }

    /// Action 4: delete the manager relationship.
    ///
    /// The manager, and transitively the manager's own chain, lose
    /// derived access to teams reachable only through the removed edge.
    /// Access anchored by another subordinate survives.
    pub async fn remove_manager(
        &self,
        user_id: Uuid,
        manager_id: Uuid,
    ) -> Result<Vec<String>, EngineError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ctx = context::hierarchy(&txn, user_id, manager_id).await?;
        let edge = user_manager::Entity::find_by_id((user_id, manager_id))
            .one(&txn)
            .await?
            .ok_or(EngineError::RelationshipNotFound {
                user_id,
                manager_id,
            })?;

        let mut log = Vec::new();

        edge.delete(&txn).await?;
        log.push(format!("user {manager_id} no longer manages user {user_id}"));

        // Every chain through the removed edge starts below the
        // subordinate, so the subordinate's teams are the affected set.
        let teams = self.teams_holding_member(&txn, user_id).await?;
        let graph = ManagerGraph::load(&txn).await?;
        for team_id in teams {
            propagate::reconcile(&txn, team_id, &graph, self.config.max_manager_depth, &mut log)
                .await?;
        }

        txn.commit().await?;
        info!(user = %ctx.user.name, manager = %ctx.manager.name, "removed manager");

        Ok(log)
    }

    /// Action 5: make a resource visible to a team.
    ///
    /// Membership rows are untouched; the log reports who can now see
    /// the resource and why.
    pub async fn assign_resource_to_team(
        &self,
        team_id: Uuid,
        resource_id: Uuid,
    ) -> Result<Vec<String>, EngineError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ctx = context::assignment(&txn, team_id, resource_id).await?;
        if team_resource::Entity::find_by_id((team_id, resource_id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateAssignment {
                team_id,
                resource_id,
            });
        }

        let mut log = Vec::new();

        team_resource::ActiveModel {
            team_id: Set(team_id),
            resource_id: Set(resource_id),
            assigned_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        log.push(format!("assigned resource {resource_id} to team {team_id}"));

        let members = query::members_of(&txn, team_id).await?;
        log.push(format!(
            "{} member(s) of team {team_id} can now access resource {resource_id}",
            members.len()
        ));
        for member in &members {
            let why = match (member.access_type, member.granted_via) {
                (AccessType::Direct, _) => "direct member".to_string(),
                (AccessType::Manager, Some(via)) => format!("manager via user {via}"),
                (AccessType::Manager, None) => "manager".to_string(),
            };
            log.push(format!(
                "user {} can now access resource {resource_id} ({why})",
                member.user_id
            ));
        }

        txn.commit().await?;
        info!(team = %ctx.team.name, resource = %ctx.resource.name, "assigned resource");

        Ok(log)
    }

    /// Action 6: remove a resource from a team.
    ///
    /// The log reports, per member, whether visibility is lost or
    /// retained through membership in another team still holding the
    /// resource.
    pub async fn remove_resource_from_team(
        &self,
        team_id: Uuid,
        resource_id: Uuid,
    ) -> Result<Vec<String>, EngineError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ctx = context::assignment(&txn, team_id, resource_id).await?;
        let assignment = team_resource::Entity::find_by_id((team_id, resource_id))
            .one(&txn)
            .await?
            .ok_or(EngineError::AssignmentNotFound {
                team_id,
                resource_id,
            })?;

        let mut log = Vec::new();

        assignment.delete(&txn).await?;
        log.push(format!("removed resource {resource_id} from team {team_id}"));

        for member in query::members_of(&txn, team_id).await? {
            match query::retains_access_via_other_team(&txn, member.user_id, resource_id, team_id)
                .await?
            {
                Some(other_team) => log.push(format!(
                    "user {} still has access to resource {resource_id} via team {other_team}",
                    member.user_id
                )),
                None => log.push(format!(
                    "user {} lost access to resource {resource_id}",
                    member.user_id
                )),
            }
        }

        txn.commit().await?;
        info!(team = %ctx.team.name, resource = %ctx.resource.name, "removed resource");

        Ok(log)
    }

    /// Who is in a team, and why.
    pub async fn members_of(&self, team_id: Uuid) -> Result<Vec<team_member::Model>, EngineError> {
        context::fetch_team(&self.db, team_id).await?;
        Ok(query::members_of(&self.db, team_id).await?)
    }

    /// Which teams a user belongs to, and why.
    pub async fn teams_of(&self, user_id: Uuid) -> Result<Vec<team_member::Model>, EngineError> {
        context::fetch_user(&self.db, user_id).await?;
        Ok(query::teams_of(&self.db, user_id).await?)
    }

    /// Who can see a resource, one row per granting membership.
    pub async fn accessors_of(
        &self,
        resource_id: Uuid,
    ) -> Result<Vec<team_member::Model>, EngineError> {
        context::fetch_resource(&self.db, resource_id).await?;
        Ok(query::accessors_of(&self.db, resource_id).await?)
    }

    /// Distinct teams where the user holds any membership row, direct or
    /// manager-derived.
    async fn teams_holding_member(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, EngineError> {
        let rows = query::teams_of(txn, user_id).await?;
        debug!(%user_id, teams = rows.len(), "collected affected teams");
        Ok(rows.into_iter().map(|row| row.team_id).collect())
    }
}
