pub mod health;
pub mod metrics;
pub mod plates;
pub mod request_id;
pub mod reservations;
pub mod sensors;
