//! One file per command. Each exports `COMMAND`, `guard` and `handle`.

use crate::api::Api;
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::service::Lernreise;
use crate::store::InstanceStore;

pub mod catalog_detail;
pub mod catalog_list;
pub mod context_resolve;
pub mod instance_abandon;
pub mod instance_active;
pub mod instance_get;
pub mod instance_list;
pub mod instance_pause;
pub mod instance_resume;
pub mod instance_select;
pub mod progress_list;
pub mod task_submit;

/// An [`Api`] with every Lernreise command registered.
pub fn api<S, C, G>(service: Lernreise<S, C, G>) -> Api<Lernreise<S, C, G>>
where
    S: InstanceStore + 'static,
    C: CatalogGateway + 'static,
    G: RegistryGateway + 'static,
{
    crate::register_handlers!(
        Api::new(service),
        context_resolve,
        catalog_list,
        catalog_detail,
        instance_select,
        instance_active,
        instance_list,
        instance_get,
        instance_pause,
        instance_resume,
        instance_abandon,
        task_submit,
        progress_list,
    )
}
