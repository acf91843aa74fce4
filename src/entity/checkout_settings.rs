use sea_orm::entity::prelude::*;

/// Single-row table; the row with id = 1 holds the live settings.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "checkout_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub tax_percent: i64,
    pub shipping_fee: i64,
    pub free_shipping_above: Option<i64>,
    pub cod_limit: i64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
