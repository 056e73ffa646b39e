pub mod configs;
pub mod curve;
pub mod error;
pub mod metrics;
mod polling;
mod session;

pub use error::DashboardError;
pub use polling::Concern;
pub use session::{Dashboard, DashboardEvent, DashboardView, IdleView, Joined, Phase};
