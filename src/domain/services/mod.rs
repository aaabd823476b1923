pub mod payment_service;
