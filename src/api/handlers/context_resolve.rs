//! Handler: context.resolve

use serde_json::{json, Value};

use crate::api::{Context, HandlerError};
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::service::Lernreise;
use crate::store::InstanceStore;

pub const COMMAND: &str = "context.resolve";

pub fn guard<L>(_ctx: &Context<L>) -> bool {
    true
}

pub fn handle<S, C, G>(ctx: &Context<Lernreise<S, C, G>>) -> Result<Value, HandlerError>
where
    S: InstanceStore,
    C: CatalogGateway,
    G: RegistryGateway,
{
    let caller = ctx.caller()?;
    let context_id = ctx.service().resolve_context(&caller)?;
    Ok(json!({ "context_id": context_id }))
}
