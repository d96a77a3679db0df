//! Handler: catalog.detail

use serde::Deserialize;
use serde_json::Value;

use crate::api::{Context, HandlerError};
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::service::Lernreise;
use crate::store::InstanceStore;

pub const COMMAND: &str = "catalog.detail";

#[derive(Deserialize)]
pub struct Input {
    pub course_id: String,
}

pub fn guard<L>(ctx: &Context<L>) -> bool {
    ctx.has_field("course_id")
}

pub fn handle<S, C, G>(ctx: &Context<Lernreise<S, C, G>>) -> Result<Value, HandlerError>
where
    S: InstanceStore,
    C: CatalogGateway,
    G: RegistryGateway,
{
    let caller = ctx.caller()?;
    let input = ctx.input::<Input>()?;
    let course = ctx.service().get_catalog_detail(&caller, &input.course_id)?;
    Ok(serde_json::to_value(course)?)
}
