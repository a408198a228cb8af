//! Consolidated initial schema migration

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::Name, 255).not_null())
                    .col(string_len(User::Role, 64).not_null())
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email")
                    .table(User::Table)
                    .col(User::Email)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create teams table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(uuid(Team::Id).primary_key())
                    .col(string_len(Team::Name, 255).not_null())
                    .col(
                        boolean(Team::AutoAssignClients)
                            .not_null()
                            .default(false),
                    )
                    .col(
                        timestamp_with_time_zone(Team::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create resources table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Resource::Table)
                    .if_not_exists()
                    .col(uuid(Resource::Id).primary_key())
                    .col(string_len(Resource::Name, 255).not_null())
                    .col(string_len(Resource::Type, 64).not_null())
                    .col(string_len(Resource::Segment, 64).not_null())
                    .col(
                        timestamp_with_time_zone(Resource::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create user_managers junction table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(UserManager::Table)
                    .if_not_exists()
                    .col(uuid(UserManager::UserId).not_null())
                    .col(uuid(UserManager::ManagerId).not_null())
                    .col(
                        timestamp_with_time_zone(UserManager::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserManager::UserId)
                            .col(UserManager::ManagerId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_managers_user_id")
                            .from(UserManager::Table, UserManager::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_managers_manager_id")
                            .from(UserManager::Table, UserManager::ManagerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_managers_user_id")
                    .table(UserManager::Table)
                    .col(UserManager::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_managers_manager_id")
                    .table(UserManager::Table)
                    .col(UserManager::ManagerId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Create team_members junction table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TeamMember::Table)
                    .if_not_exists()
                    .col(uuid(TeamMember::TeamId).not_null())
                    .col(uuid(TeamMember::UserId).not_null())
                    .col(string_len(TeamMember::AccessType, 32).not_null())
                    .col(uuid_null(TeamMember::GrantedVia))
                    .col(
                        timestamp_with_time_zone(TeamMember::JoinedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(TeamMember::TeamId)
                            .col(TeamMember::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_team_id")
                            .from(TeamMember::Table, TeamMember::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_user_id")
                            .from(TeamMember::Table, TeamMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_user_id")
                    .table(TeamMember::Table)
                    .col(TeamMember::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_granted_via")
                    .table(TeamMember::Table)
                    .col(TeamMember::GrantedVia)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. Create team_resources junction table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TeamResource::Table)
                    .if_not_exists()
                    .col(uuid(TeamResource::TeamId).not_null())
                    .col(uuid(TeamResource::ResourceId).not_null())
                    .col(
                        timestamp_with_time_zone(TeamResource::AssignedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(TeamResource::TeamId)
                            .col(TeamResource::ResourceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_resources_team_id")
                            .from(TeamResource::Table, TeamResource::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_resources_resource_id")
                            .from(TeamResource::Table, TeamResource::ResourceId)
                            .to(Resource::Table, Resource::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_resources_resource_id")
                    .table(TeamResource::Table)
                    .col(TeamResource::ResourceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order (respecting foreign keys)
        manager
            .drop_table(Table::drop().table(TeamResource::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TeamMember::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserManager::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Resource::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    Name,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Team {
    #[sea_orm(iden = "teams")]
    Table,
    Id,
    Name,
    AutoAssignClients,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Resource {
    #[sea_orm(iden = "resources")]
    Table,
    Id,
    Name,
    Type,
    Segment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserManager {
    #[sea_orm(iden = "user_managers")]
    Table,
    UserId,
    ManagerId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeamMember {
    #[sea_orm(iden = "team_members")]
    Table,
    TeamId,
    UserId,
    AccessType,
    GrantedVia,
    JoinedAt,
}

#[derive(DeriveIden)]
enum TeamResource {
    #[sea_orm(iden = "team_resources")]
    Table,
    TeamId,
    ResourceId,
    AssignedAt,
}
