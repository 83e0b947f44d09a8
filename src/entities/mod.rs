pub mod booking;
pub mod notification;
pub mod payment;
pub mod service;
pub mod user;
pub mod vehicle;
