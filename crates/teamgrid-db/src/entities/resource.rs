//! Resource entity: client records visible to team members

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    /// Resource UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Resource name, e.g. the client's legal name
    pub name: String,

    /// Resource category, e.g. "client"
    #[sea_orm(column_name = "type")]
    pub resource_type: String,

    /// Business segment, e.g. "Private" or "Corporate"
    pub segment: String,

    /// When the resource record was created
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Resource is assigned to teams
    #[sea_orm(has_many = "super::team_resource::Entity")]
    Assignments,
}

impl Related<super::team_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
