//! Handler: instance.active

use serde_json::{json, Value};

use crate::api::{Context, HandlerError};
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::service::Lernreise;
use crate::store::InstanceStore;

pub const COMMAND: &str = "instance.active";

pub fn guard<L>(_ctx: &Context<L>) -> bool {
    true
}

/// `{ "instance": null }` when the caller has no active instance.
pub fn handle<S, C, G>(ctx: &Context<Lernreise<S, C, G>>) -> Result<Value, HandlerError>
where
    S: InstanceStore,
    C: CatalogGateway,
    G: RegistryGateway,
{
    let caller = ctx.caller()?;
    let instance = ctx.service().get_active(&caller)?;
    Ok(json!({ "instance": instance }))
}
