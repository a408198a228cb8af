//! Team entity: groups of users sharing access to client resources

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    /// Team UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Team name (human-readable)
    pub name: String,

    /// Read by the external auto-assignment collaborator, never by the engine
    pub auto_assign_clients: bool,

    /// When the team was created
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Team has members
    #[sea_orm(has_many = "super::team_member::Entity")]
    Members,

    /// Team has assigned resources
    #[sea_orm(has_many = "super::team_resource::Entity")]
    Resources,
}

impl Related<super::team_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::team_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
