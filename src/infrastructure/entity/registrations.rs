//! `SeaORM` entity for completed registrations

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub registration_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub registration_number: String,
    pub id_proof_file_name: String,
    pub payment_id: String,
    pub payment_status: String,
    /// whole rupees
    pub payment_amount: i64,
    pub coupon_applied: String,
    pub registration_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
