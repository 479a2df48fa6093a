pub mod error;
pub mod notifications;
pub mod routine;
pub mod service;
pub mod store;

pub use crate::error::RoutineError;
pub use crate::routine::Routine;
pub use crate::service::{RoutineService, RoutineServiceBuilder};
pub use crate::store::{JsonRoutineStore, MemoryRoutineStore, RoutineStore};
