//! Notification audit entity.
//!
//! One row per notification-send request; rows are never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    /// Raw notification text, may contain @mention tokens.
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Comma-space-joined list of computed recipient emails.
    #[sea_orm(column_type = "Text")]
    pub emails: String,

    pub created_by: String,

    pub updated_by: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
