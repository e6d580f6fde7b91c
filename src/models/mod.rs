pub mod appointment;
pub mod availability;
pub mod business_hours;
pub mod posts;
pub mod service;
pub mod slot;
