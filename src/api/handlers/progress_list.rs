//! Handler: progress.list

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{Context, HandlerError};
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::service::Lernreise;
use crate::store::InstanceStore;

pub const COMMAND: &str = "progress.list";

#[derive(Deserialize)]
pub struct Input {
    pub instance_id: String,
}

pub fn guard<L>(ctx: &Context<L>) -> bool {
    ctx.has_field("instance_id")
}

pub fn handle<S, C, G>(ctx: &Context<Lernreise<S, C, G>>) -> Result<Value, HandlerError>
where
    S: InstanceStore,
    C: CatalogGateway,
    G: RegistryGateway,
{
    let caller = ctx.caller()?;
    let input = ctx.input::<Input>()?;
    let events = ctx.service().list_progress(&caller, &input.instance_id)?;
    Ok(json!({ "events": events }))
}
