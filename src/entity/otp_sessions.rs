use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub mobile: String,
    pub purpose: String,
    pub code_hash: String,
    pub state: String,
    pub attempts: i32,
    pub expires_at: DateTimeWithTimeZone,
    pub resend_available_at: DateTimeWithTimeZone,
    pub continuation_token: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
