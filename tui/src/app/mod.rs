pub mod run;

use api::HttpBackend;
use orchestrator::Dashboard;
use tokio::runtime::Runtime;

/// What a screen gets to drive the dashboard with.
///
/// One-shot actions are awaited with `runtime.block_on`, the background polls
/// keep running on the runtime's workers meanwhile.
pub struct Ctx<'a> {
    pub runtime: &'a Runtime,
    pub dashboard: &'a mut Dashboard<HttpBackend>,
}
