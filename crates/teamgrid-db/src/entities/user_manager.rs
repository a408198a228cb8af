//! UserManager entity: directed "manages" edges of the org chart

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One edge means "manager_id manages user_id". A user may have several
/// managers; the graph must stay acyclic and depth-bounded, which the
/// engine enforces before inserting.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_managers")]
pub struct Model {
    /// Managed user UUID (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    /// Managing user UUID (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub manager_id: Uuid,

    /// When the relationship was created
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The managed user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,

    /// The managing user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ManagerId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Manager,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
