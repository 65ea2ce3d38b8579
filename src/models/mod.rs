pub mod driver;
pub mod event;
pub mod order;
pub mod route;
pub mod telemetry;
