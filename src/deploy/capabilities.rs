// ABOUTME: Bundle of the external collaborators a workflow runs against.

use crate::prompt::InteractivePrompt;
use crate::release::Clock;
use crate::remote::{Host, LocalExecutor};
use crate::serving::ServingLayerControl;
use crate::tasks::ProvisioningTask;

/// Everything outside the core that a deploy or rollback touches.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub host: Host<'a>,
    pub local: &'a dyn LocalExecutor,
    pub prompt: &'a dyn InteractivePrompt,
    pub serving: &'a dyn ServingLayerControl,
    pub tasks: &'a dyn ProvisioningTask,
    pub clock: &'a dyn Clock,
}
