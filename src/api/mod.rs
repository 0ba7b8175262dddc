pub mod health;
pub mod routes;

pub use health::{HealthResponse, HealthState};
pub use routes::{router, ApiState};
