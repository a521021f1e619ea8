//! Configuration-driven adapter.

use async_trait::async_trait;

use super::{AdapterContext, SiteAdapter};

/// Uses every default step of [`SiteAdapter`].
pub struct GenericAdapter {
    ctx: AdapterContext,
}

impl GenericAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SiteAdapter for GenericAdapter {
    fn context(&self) -> &AdapterContext {
        &self.ctx
    }
}
