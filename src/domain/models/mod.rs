pub mod coupon;
pub mod entry_pass;
pub mod event;
pub mod registration;
