use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 定时备份设置，表里只有一行（id = 1）
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "backup_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub enabled: bool,
    pub frequency: String,   // daily/weekly/monthly
    pub time_of_day: String, // HH:MM
    pub last_run_at: Option<i64>,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
