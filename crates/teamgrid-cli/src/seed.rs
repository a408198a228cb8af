//! Sample organization seeding
//!
//! Creates a small banking-style org chart and drives every membership,
//! hierarchy, and resource assignment through the engine, so all derived
//! rows come from propagation. Expects an empty, migrated database.

use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::info;
use uuid::Uuid;

use teamgrid_db::entities::{resource, team, user};
use teamgrid_engine::AccessEngine;

async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
    role: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        role: Set(role.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .with_context(|| format!("creating user {name}"))?;

    Ok(id)
}

async fn create_team(db: &DatabaseConnection, name: &str, auto_assign: bool) -> Result<Uuid> {
    let id = Uuid::new_v4();
    team::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        auto_assign_clients: Set(auto_assign),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .with_context(|| format!("creating team {name}"))?;

    Ok(id)
}

async fn create_resource(db: &DatabaseConnection, name: &str, segment: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    resource::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        resource_type: Set("client".to_string()),
        segment: Set(segment.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .with_context(|| format!("creating resource {name}"))?;

    Ok(id)
}

pub async fn run(db: &DatabaseConnection) -> Result<()> {
    let engine = AccessEngine::new(db.clone());

    info!("seeding sample organization");

    let john = create_user(db, "john.doe@teamgrid.io", "John Doe", "Head of RM").await?;
    let sarah = create_user(db, "sarah.smith@teamgrid.io", "Sarah Smith", "Senior RM").await?;
    let mike = create_user(db, "mike.johnson@teamgrid.io", "Mike Johnson", "Senior RM").await?;
    let emma = create_user(db, "emma.wilson@teamgrid.io", "Emma Wilson", "RM").await?;
    let david = create_user(db, "david.brown@teamgrid.io", "David Brown", "RM").await?;
    let lisa = create_user(db, "lisa.garcia@teamgrid.io", "Lisa Garcia", "RM").await?;
    let tom = create_user(db, "tom.lee@teamgrid.io", "Tom Lee", "RM").await?;
    let anna = create_user(db, "anna.taylor@teamgrid.io", "Anna Taylor", "Senior RM").await?;

    let private_apac = create_team(db, "Private Banking - APAC", true).await?;
    let corporate_emea = create_team(db, "Corporate Banking - EMEA", false).await?;
    let retail_americas = create_team(db, "Retail Banking - Americas", true).await?;

    let techcorp = create_resource(db, "TechCorp Industries", "Corporate").await?;
    let global_finance = create_resource(db, "Global Finance Ltd", "Private").await?;
    let startup_ventures = create_resource(db, "Startup Ventures", "Retail").await?;
    let megacorp = create_resource(db, "MegaCorp Holdings", "Corporate").await?;
    let family_trust = create_resource(db, "Family Trust Fund", "Private").await?;

    // Org chart: John heads both senior RMs and Anna; Sarah and Mike
    // each run a pair of RMs. Assigned before memberships so team adds
    // exercise upward propagation.
    let mut log = Vec::new();
    for (user_id, manager_id) in [
        (sarah, john),
        (mike, john),
        (anna, john),
        (emma, sarah),
        (david, sarah),
        (lisa, mike),
        (tom, mike),
    ] {
        log.extend(engine.assign_manager(user_id, manager_id).await?);
    }

    for (user_id, team_id) in [
        (sarah, private_apac),
        (emma, private_apac),
        (david, private_apac),
        (mike, corporate_emea),
        (lisa, corporate_emea),
        (anna, retail_americas),
        (tom, retail_americas),
    ] {
        log.extend(engine.add_user_to_team(user_id, team_id).await?);
    }

    for (team_id, resource_id) in [
        (private_apac, global_finance),
        (private_apac, family_trust),
        (corporate_emea, techcorp),
        (corporate_emea, megacorp),
        (retail_americas, startup_ventures),
    ] {
        log.extend(engine.assign_resource_to_team(team_id, resource_id).await?);
    }

    for line in &log {
        println!("{line}");
    }
    info!(mutations = log.len(), "seed complete");

    Ok(())
}
