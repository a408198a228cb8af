//! TeamMember entity: direct and manager-derived team memberships

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a user came to hold access to a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AccessType {
    /// Explicitly added to the team
    #[sea_orm(string_value = "direct")]
    Direct,

    /// Inherited because the holder manages a member, directly or transitively
    #[sea_orm(string_value = "manager")]
    Manager,
}

/// At most one row exists per (team, user). For manager-type rows,
/// `granted_via` names the immediate downstream link in the management
/// chain; following those links through this table always ends at a
/// direct member of the same team. Rows are written exclusively by the
/// propagation engine.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_members")]
pub struct Model {
    /// Team UUID (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub team_id: Uuid,

    /// User UUID (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    /// Direct membership or manager-derived access
    pub access_type: AccessType,

    /// Immediate chain link for manager-type rows, null for direct rows
    pub granted_via: Option<Uuid>,

    /// When the membership row was created
    pub joined_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Membership belongs to a team
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Team,

    /// Membership belongs to a user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
