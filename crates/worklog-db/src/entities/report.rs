//! Report entity.
//!
//! One record per reporting period per user. The `tags`, `attachments`
//! and `approvals` columns are JSONB; typed accessors deserialize them.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ReportStatus {
    /// Whether this report has left draft at least once.
    #[must_use]
    pub const fn is_submitted_or_later(self) -> bool {
        !matches!(self, Self::Draft)
    }

    /// String form as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

/// Action recorded by an approval event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approved,
    Rejected,
}

/// Immutable record of an admin decision, appended to `approvals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    /// Deciding actor's user ID.
    pub by: String,
    /// The decision taken.
    pub action: ApprovalAction,
    /// Reviewer comment. Mandatory for rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When the decision was made.
    pub at: DateTime<Utc>,
}

/// Attachment metadata. The blob itself lives in the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Generated storage key.
    pub key: String,
    /// Original filename as uploaded.
    pub original_name: String,
    /// MIME content type.
    pub mime: String,
    /// Size in bytes, when known at upload time.
    pub size: Option<u64>,
    /// Retrieval URL.
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner user ID. Immutable after creation.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Reporting week number.
    pub week: i32,

    /// Reporting year.
    pub year: i32,

    /// Reporting month, when supplied.
    #[sea_orm(nullable)]
    pub month: Option<i32>,

    /// What was accomplished this period.
    #[sea_orm(column_type = "Text", nullable)]
    pub achievements: Option<String>,

    /// Blockers and problems encountered.
    #[sea_orm(column_type = "Text", nullable)]
    pub challenges: Option<String>,

    /// Plan for the next period.
    #[sea_orm(column_type = "Text", nullable)]
    pub next_week_plan: Option<String>,

    /// Lifecycle status.
    pub status: ReportStatus,

    /// Attachment metadata, append-only.
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Json,

    /// Tags, order-preserving.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    /// Approval trail, append-only.
    #[sea_orm(column_type = "JsonBinary")]
    pub approvals: Json,

    pub created_at: DateTimeWithTimeZone,

    /// Set each time the report enters `submitted`.
    #[sea_orm(nullable)]
    pub submitted_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Tags deserialized from the JSONB column.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }

    /// Attachment metadata deserialized from the JSONB column.
    #[must_use]
    pub fn attachment_list(&self) -> Vec<Attachment> {
        serde_json::from_value(self.attachments.clone()).unwrap_or_default()
    }

    /// Approval trail deserialized from the JSONB column.
    #[must_use]
    pub fn approval_trail(&self) -> Vec<ApprovalEvent> {
        serde_json::from_value(self.approvals.clone()).unwrap_or_default()
    }
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
