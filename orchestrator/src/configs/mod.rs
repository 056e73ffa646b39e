mod dashboard;
mod draft;
mod palette;

pub use dashboard::{DashboardConfig, PollIntervals, Role};
pub use draft::{PeerDraft, SessionDraft};
pub use palette::{Palette, Rgb};
