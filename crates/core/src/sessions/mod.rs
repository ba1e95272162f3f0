//! Simulation sessions - domain models, services, and traits.

mod sessions_model;
mod sessions_service;
mod sessions_traits;

pub use sessions_model::{NewSession, SimulationSession};
pub use sessions_service::SessionService;
pub use sessions_traits::{SessionRepositoryTrait, SessionServiceTrait};
