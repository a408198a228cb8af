//! End-to-end tests for the six engine actions
//!
//! Every test drives a real SQLite in-memory database through the
//! engine; derived rows are never hand-inserted.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

use teamgrid_db::entities::{
    resource, team,
    team_member::{self, AccessType},
    user, user_manager,
};
use teamgrid_db::{connect, migrate};
use teamgrid_engine::{AccessEngine, EngineError};

async fn setup() -> (DatabaseConnection, AccessEngine) {
    let db = connect("sqlite::memory:").await.expect("connect");
    migrate(&db).await.expect("migrate");
    let engine = AccessEngine::new(db.clone());
    (db, engine)
}

async fn create_user(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(format!("{}-{}@teamgrid.test", name.to_lowercase(), id)),
        name: Set(name.to_string()),
        role: Set("RM".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert user");
    id
}

async fn create_team(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    team::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        auto_assign_clients: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert team");
    id
}

async fn create_resource(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    resource::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        resource_type: Set("client".to_string()),
        segment: Set("Private".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert resource");
    id
}

/// Membership rows of a team keyed by user: (access type, granted_via).
async fn memberships(
    engine: &AccessEngine,
    team_id: Uuid,
) -> HashMap<Uuid, (AccessType, Option<Uuid>)> {
    engine
        .members_of(team_id)
        .await
        .expect("members_of")
        .into_iter()
        .map(|row| (row.user_id, (row.access_type, row.granted_via)))
        .collect()
}

/// Every manager-type row must reach a direct member of the same team by
/// following its granted_via links through membership rows.
async fn assert_anchored(engine: &AccessEngine, team_id: Uuid) {
    let rows = memberships(engine, team_id).await;
    for (&user_id, &(access, _)) in &rows {
        if access != AccessType::Manager {
            continue;
        }
        let mut current = user_id;
        let mut hops = 0;
        loop {
            let &(access, via) = rows
                .get(&current)
                .unwrap_or_else(|| panic!("granted_via chain of {user_id} left the team"));
            if access == AccessType::Direct {
                break;
            }
            current = via.unwrap_or_else(|| panic!("manager row {current} lost its link"));
            hops += 1;
            assert!(hops <= rows.len(), "granted_via chain of {user_id} loops");
        }
    }
}

// ------------------------------------------------------------------
// Action 1: add user to team
// ------------------------------------------------------------------

#[tokio::test]
async fn add_user_grants_manager_chain_with_immediate_links() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let john = create_user(&db, "John").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.assign_manager(emma, sarah).await.expect("emma -> sarah");
    engine.assign_manager(sarah, john).await.expect("sarah -> john");

    let log = engine.add_user_to_team(emma, team).await.expect("add emma");
    assert_eq!(log.len(), 3, "direct insert plus two grants: {log:?}");

    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&emma], (AccessType::Direct, None));
    assert_eq!(rows[&sarah], (AccessType::Manager, Some(emma)));
    // Attribution points at the immediate link, not the triggering user.
    assert_eq!(rows[&john], (AccessType::Manager, Some(sarah)));
    assert_anchored(&engine, team).await;
}

#[tokio::test]
async fn add_user_skips_managers_already_direct() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    engine.add_user_to_team(sarah, team).await.expect("add sarah");
    engine.add_user_to_team(emma, team).await.expect("add emma");

    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&sarah], (AccessType::Direct, None), "direct must win");
    assert_eq!(rows[&emma], (AccessType::Direct, None));
}

#[tokio::test]
async fn add_user_bounds_propagation_depth() {
    let (db, engine) = setup().await;
    let worker = create_user(&db, "Worker").await;
    let mut chain = vec![worker];
    for name in ["L1", "L2", "L3"] {
        let manager = create_user(&db, name).await;
        engine
            .assign_manager(*chain.last().unwrap(), manager)
            .await
            .expect("assign");
        chain.push(manager);
    }
    let team = create_team(&db, "Ops").await;

    engine.add_user_to_team(worker, team).await.expect("add");

    // Worker plus exactly three levels of managers.
    let rows = memberships(&engine, team).await;
    assert_eq!(rows.len(), 4);
}

#[tokio::test]
async fn duplicate_add_is_rejected_without_state_change() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.add_user_to_team(emma, team).await.expect("first add");
    let err = engine.add_user_to_team(emma, team).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateMembership { .. }));

    let count = team_member::Entity::find().count(&db).await.expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn add_is_rejected_when_a_manager_row_exists() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    engine.add_user_to_team(emma, team).await.expect("add emma");

    // Sarah holds a manager row; one row per (team, user) means the
    // direct add conflicts rather than upgrading.
    let err = engine.add_user_to_team(sarah, team).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateMembership { .. }));
}

#[tokio::test]
async fn add_rejects_unknown_user_and_team() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    let err = engine
        .add_user_to_team(Uuid::new_v4(), team)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UserNotFound(_)));

    let err = engine
        .add_user_to_team(emma, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TeamNotFound(_)));
}

// ------------------------------------------------------------------
// Action 2: remove user from team
// ------------------------------------------------------------------

#[tokio::test]
async fn remove_user_cascades_through_every_level() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let john = create_user(&db, "John").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    engine.assign_manager(sarah, john).await.expect("assign");
    engine.add_user_to_team(emma, team).await.expect("add");

    let log = engine
        .remove_user_from_team(emma, team)
        .await
        .expect("remove");

    // The whole chain collapses, not just the first level.
    assert!(memberships(&engine, team).await.is_empty(), "{log:?}");
}

#[tokio::test]
async fn remove_user_keeps_managers_anchored_elsewhere() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let david = create_user(&db, "David").await;
    let sarah = create_user(&db, "Sarah").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    engine.assign_manager(david, sarah).await.expect("assign");
    engine.add_user_to_team(emma, team).await.expect("add emma");
    engine.add_user_to_team(david, team).await.expect("add david");

    let log = engine
        .remove_user_from_team(emma, team)
        .await
        .expect("remove");

    // Sarah still manages David, so her access survives, re-anchored.
    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&sarah], (AccessType::Manager, Some(david)));
    assert!(!rows.contains_key(&emma));
    assert!(
        log.iter().any(|line| line.contains("re-anchored")),
        "{log:?}"
    );
    assert_anchored(&engine, team).await;
}

#[tokio::test]
async fn removed_direct_member_keeps_access_while_managing_a_member() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.add_user_to_team(sarah, team).await.expect("add sarah");
    engine.add_user_to_team(emma, team).await.expect("add emma");
    engine.assign_manager(emma, sarah).await.expect("assign");

    engine
        .remove_user_from_team(sarah, team)
        .await
        .expect("remove");

    // Sarah lost the direct row but still manages Emma, a direct member.
    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&sarah], (AccessType::Manager, Some(emma)));
    assert_anchored(&engine, team).await;
}

#[tokio::test]
async fn remove_user_requires_a_direct_row() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    engine.add_user_to_team(emma, team).await.expect("add");

    // Sarah's row is manager-derived; only propagation may retire it.
    let err = engine.remove_user_from_team(sarah, team).await.unwrap_err();
    assert!(matches!(err, EngineError::MembershipNotFound { .. }));

    let err = engine
        .remove_user_from_team(create_user(&db, "Lisa").await, team)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MembershipNotFound { .. }));
}

// ------------------------------------------------------------------
// Action 3: assign manager
// ------------------------------------------------------------------

#[tokio::test]
async fn assign_manager_inherits_existing_teams() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let team_a = create_team(&db, "Private Banking - APAC").await;
    let team_b = create_team(&db, "Corporate Banking - EMEA").await;

    engine.add_user_to_team(emma, team_a).await.expect("add");
    engine.add_user_to_team(emma, team_b).await.expect("add");

    engine.assign_manager(emma, sarah).await.expect("assign");

    for team in [team_a, team_b] {
        let rows = memberships(&engine, team).await;
        assert_eq!(rows[&sarah], (AccessType::Manager, Some(emma)));
    }
}

#[tokio::test]
async fn assign_manager_recurses_up_the_new_managers_chain() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let john = create_user(&db, "John").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.add_user_to_team(emma, team).await.expect("add");
    engine.assign_manager(sarah, john).await.expect("sarah -> john");
    engine.assign_manager(emma, sarah).await.expect("emma -> sarah");

    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&sarah], (AccessType::Manager, Some(emma)));
    assert_eq!(rows[&john], (AccessType::Manager, Some(sarah)));
    assert_anchored(&engine, team).await;
}

#[tokio::test]
async fn assign_manager_covers_teams_anchored_through_a_chain() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let john = create_user(&db, "John").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.add_user_to_team(emma, team).await.expect("add");
    engine.assign_manager(emma, sarah).await.expect("emma -> sarah");

    // Sarah only holds manager-derived access, yet assigning John above
    // her must still reach the team she anchors through Emma.
    engine.assign_manager(sarah, john).await.expect("sarah -> john");

    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&john], (AccessType::Manager, Some(sarah)));
}

#[tokio::test]
async fn self_management_is_rejected() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;

    let err = engine.assign_manager(emma, emma).await.unwrap_err();
    assert!(matches!(err, EngineError::SelfManagement(_)));
}

#[tokio::test]
async fn duplicate_relationship_is_rejected() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    let err = engine.assign_manager(emma, sarah).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateRelationship { .. }));
}

#[tokio::test]
async fn cycles_are_rejected_including_transitive_ones() {
    let (db, engine) = setup().await;
    let a = create_user(&db, "Alex").await;
    let b = create_user(&db, "Bob").await;
    let c = create_user(&db, "Carol").await;

    engine.assign_manager(a, b).await.expect("a -> b");
    let err = engine.assign_manager(b, a).await.unwrap_err();
    assert!(matches!(err, EngineError::CircularManagement { .. }));

    // Two hops: a -> b -> c, then closing c -> a must also fail.
    engine.assign_manager(b, c).await.expect("b -> c");
    let err = engine.assign_manager(c, a).await.unwrap_err();
    assert!(matches!(err, EngineError::CircularManagement { .. }));

    let edges = user_manager::Entity::find().count(&db).await.expect("count");
    assert_eq!(edges, 2, "failed calls must leave no state behind");
}

#[tokio::test]
async fn depth_limit_is_enforced_on_assignment() {
    let (db, engine) = setup().await;
    let a = create_user(&db, "Alex").await;
    let b = create_user(&db, "Bob").await;
    let c = create_user(&db, "Carol").await;
    let d = create_user(&db, "Dana").await;
    let e = create_user(&db, "Eli").await;

    // Build the chain from the top so each new edge deepens the span
    // above the next subordinate: d -> e, c -> d -> e, b -> c -> d -> e.
    engine.assign_manager(d, e).await.expect("d -> e");
    engine.assign_manager(c, d).await.expect("c -> d");
    engine.assign_manager(b, c).await.expect("b -> c");

    // A fourth hop would put the chain above Bob past the limit.
    let err = engine.assign_manager(a, b).await.unwrap_err();
    assert!(matches!(err, EngineError::DepthExceeded { max_depth: 3, .. }));

    let edges = user_manager::Entity::find().count(&db).await.expect("count");
    assert_eq!(edges, 3);
}

// ------------------------------------------------------------------
// Action 4: remove manager
// ------------------------------------------------------------------

#[tokio::test]
async fn multi_subordinate_retention_scenario() {
    let (db, engine) = setup().await;
    let alex = create_user(&db, "Alex").await;
    let bob = create_user(&db, "Bob").await;
    let moe = create_user(&db, "Moe").await;
    let roger = create_user(&db, "Roger").await;
    let team = create_team(&db, "Team One").await;

    engine.add_user_to_team(alex, team).await.expect("add alex");
    engine.add_user_to_team(bob, team).await.expect("add bob");
    engine.assign_manager(alex, moe).await.expect("alex -> moe");
    engine.assign_manager(bob, moe).await.expect("bob -> moe");
    engine.assign_manager(moe, roger).await.expect("moe -> roger");

    let rows = memberships(&engine, team).await;
    assert_eq!(rows.len(), 4, "moe and roger inherited access: {rows:?}");

    // Moe still manages Bob, so Moe and Roger both stay.
    engine.remove_manager(alex, moe).await.expect("remove one");
    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&moe], (AccessType::Manager, Some(bob)));
    assert!(rows.contains_key(&roger));
    assert_anchored(&engine, team).await;

    // The last anchoring subordinate goes; Moe and Roger collapse.
    engine.remove_manager(bob, moe).await.expect("remove last");
    let rows = memberships(&engine, team).await;
    let remaining: HashSet<Uuid> = rows.keys().copied().collect();
    assert_eq!(remaining, HashSet::from([alex, bob]));
}

#[tokio::test]
async fn remove_manager_keeps_direct_membership_untouched() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let team = create_team(&db, "Private Banking - APAC").await;

    engine.add_user_to_team(emma, team).await.expect("add emma");
    engine.add_user_to_team(sarah, team).await.expect("add sarah");
    engine.assign_manager(emma, sarah).await.expect("assign");

    engine.remove_manager(emma, sarah).await.expect("remove");

    // Sarah was a direct member all along; the edge removal must not
    // disturb that row.
    let rows = memberships(&engine, team).await;
    assert_eq!(rows[&sarah], (AccessType::Direct, None));
}

#[tokio::test]
async fn remove_manager_requires_the_edge() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;

    let err = engine.remove_manager(emma, sarah).await.unwrap_err();
    assert!(matches!(err, EngineError::RelationshipNotFound { .. }));
}

// ------------------------------------------------------------------
// Actions 5 & 6: resource assignment
// ------------------------------------------------------------------

#[tokio::test]
async fn resource_visibility_round_trip() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let sarah = create_user(&db, "Sarah").await;
    let team = create_team(&db, "Private Banking - APAC").await;
    let client = create_resource(&db, "Global Finance Ltd").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    engine.add_user_to_team(emma, team).await.expect("add");

    engine
        .assign_resource_to_team(team, client)
        .await
        .expect("assign resource");

    let accessors: HashSet<Uuid> = engine
        .accessors_of(client)
        .await
        .expect("accessors")
        .into_iter()
        .map(|row| row.user_id)
        .collect();
    assert_eq!(accessors, HashSet::from([emma, sarah]));

    engine
        .remove_resource_from_team(team, client)
        .await
        .expect("remove resource");
    assert!(engine.accessors_of(client).await.expect("accessors").is_empty());
}

#[tokio::test]
async fn resource_removal_reports_access_retained_via_other_team() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let lisa = create_user(&db, "Lisa").await;
    let team_a = create_team(&db, "Private Banking - APAC").await;
    let team_b = create_team(&db, "Corporate Banking - EMEA").await;
    let client = create_resource(&db, "Global Finance Ltd").await;

    engine.add_user_to_team(emma, team_a).await.expect("add");
    engine.add_user_to_team(lisa, team_a).await.expect("add");
    engine.add_user_to_team(emma, team_b).await.expect("add");

    engine
        .assign_resource_to_team(team_a, client)
        .await
        .expect("assign a");
    engine
        .assign_resource_to_team(team_b, client)
        .await
        .expect("assign b");

    let log = engine
        .remove_resource_from_team(team_a, client)
        .await
        .expect("remove");

    assert!(
        log.iter()
            .any(|l| l.contains(&emma.to_string()) && l.contains("still has access")),
        "{log:?}"
    );
    assert!(
        log.iter()
            .any(|l| l.contains(&lisa.to_string()) && l.contains("lost access")),
        "{log:?}"
    );

    let accessors: HashSet<Uuid> = engine
        .accessors_of(client)
        .await
        .expect("accessors")
        .into_iter()
        .map(|row| row.user_id)
        .collect();
    assert_eq!(accessors, HashSet::from([emma]));
}

#[tokio::test]
async fn duplicate_assignment_and_missing_assignment_are_rejected() {
    let (db, engine) = setup().await;
    let team = create_team(&db, "Private Banking - APAC").await;
    let client = create_resource(&db, "Global Finance Ltd").await;

    engine
        .assign_resource_to_team(team, client)
        .await
        .expect("assign");
    let err = engine
        .assign_resource_to_team(team, client)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateAssignment { .. }));

    engine
        .remove_resource_from_team(team, client)
        .await
        .expect("remove");
    let err = engine
        .remove_resource_from_team(team, client)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AssignmentNotFound { .. }));
}

// ------------------------------------------------------------------
// Invariant preservation across mixed sequences
// ------------------------------------------------------------------

#[tokio::test]
async fn anchoring_invariant_survives_a_mixed_action_sequence() {
    let (db, engine) = setup().await;
    let emma = create_user(&db, "Emma").await;
    let david = create_user(&db, "David").await;
    let sarah = create_user(&db, "Sarah").await;
    let mike = create_user(&db, "Mike").await;
    let john = create_user(&db, "John").await;
    let team_a = create_team(&db, "Private Banking - APAC").await;
    let team_b = create_team(&db, "Corporate Banking - EMEA").await;

    engine.assign_manager(emma, sarah).await.expect("assign");
    engine.assign_manager(david, sarah).await.expect("assign");
    engine.assign_manager(sarah, john).await.expect("assign");
    engine.add_user_to_team(emma, team_a).await.expect("add");
    engine.add_user_to_team(david, team_a).await.expect("add");
    engine.add_user_to_team(david, team_b).await.expect("add");
    engine.assign_manager(david, mike).await.expect("assign");
    engine.remove_user_from_team(emma, team_a).await.expect("remove");
    engine.remove_manager(david, sarah).await.expect("remove");
    engine.add_user_to_team(emma, team_b).await.expect("add");
    engine.remove_manager(david, mike).await.expect("remove");

    for team in [team_a, team_b] {
        assert_anchored(&engine, team).await;
    }

    // Deleting every direct membership collapses the derived rows too.
    for team in [team_a, team_b] {
        let direct: Vec<Uuid> = engine
            .members_of(team)
            .await
            .expect("members")
            .into_iter()
            .filter(|row| row.access_type == AccessType::Direct)
            .map(|row| row.user_id)
            .collect();
        for user in direct {
            engine.remove_user_from_team(user, team).await.expect("remove");
        }
        assert!(memberships(&engine, team).await.is_empty());
    }
}
