//! Audit log entity.
//!
//! Append-only trail of mutating actions. Rows are never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Acting user ID.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Action name (create, update, delete, submit, approve, reject).
    pub action: String,

    /// Affected report, when the action targets one.
    #[sea_orm(nullable, indexed)]
    pub report_id: Option<String>,

    /// Free-form detail payload.
    #[sea_orm(column_type = "JsonBinary")]
    pub details: Json,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
