use std::{path::Path, sync::Arc};

use anyhow::Result;

use crate::{
    infra::{
        self, config::FileConfigAdapter, contracts::ConfigAdapter,
        memory_store::InMemoryMessageStore, relay_http::HttpRelayClient,
        storage_layout::StorageLayout,
    },
    usecases::context::AppContext,
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext> {
    let context = build_context(config_path)?;
    let layout = StorageLayout::resolve()?;
    let guard = infra::logging::init(&context.config.logging, &layout)?;

    Ok(context.with_log_guard(guard))
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext> {
    let config_adapter = FileConfigAdapter::new(config_path);
    let config = config_adapter.load()?;
    let relay = HttpRelayClient::new(&config.relay)?;
    let store = InMemoryMessageStore::new();

    Ok(AppContext::new(config, Arc::new(store), Arc::new(relay)))
}
