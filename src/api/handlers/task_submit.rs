//! Handler: task.submit

use serde::Deserialize;
use serde_json::Value;

use crate::api::{Context, HandlerError};
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::service::Lernreise;
use crate::store::InstanceStore;

pub const COMMAND: &str = "task.submit";

#[derive(Deserialize)]
pub struct Input {
    pub instance_id: String,
    pub module_id: String,
    pub task_id: String,
}

pub fn guard<L>(ctx: &Context<L>) -> bool {
    ctx.has_fields(&["instance_id", "module_id", "task_id"])
}

/// Responds with the post-submission course, the progress event, the awarded
/// XP and the updated instance.
pub fn handle<S, C, G>(ctx: &Context<Lernreise<S, C, G>>) -> Result<Value, HandlerError>
where
    S: InstanceStore,
    C: CatalogGateway,
    G: RegistryGateway,
{
    let caller = ctx.caller()?;
    let input = ctx.input::<Input>()?;
    let submission =
        ctx.service()
            .submit_task(&caller, &input.instance_id, &input.module_id, &input.task_id)?;
    Ok(serde_json::to_value(submission)?)
}
