use anyhow::Result;

use crate::providers::Provider;
use crate::settings::Settings;
use crate::translator::Translator;

use super::page;

/// Shared by every request; nothing in here changes after startup.
#[derive(Clone)]
pub struct ServerState<P: Provider + Clone> {
    pub(crate) settings: Settings,
    pub(crate) translator: Translator<P>,
    pub(crate) page: String,
}

impl<P: Provider + Clone> ServerState<P> {
    pub fn new(settings: Settings, translator: Translator<P>) -> Result<Self> {
        let page = page::render_page(&settings)?;
        Ok(Self {
            settings,
            translator,
            page,
        })
    }
}
