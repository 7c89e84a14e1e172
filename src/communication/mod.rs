pub mod telegram;

use crate::configuration::Context;
use crate::database::DatabaseService;
use std::sync::Arc;

/// Shared context handed to services by the service manager.
#[derive(Clone)]
pub struct BotContext {
    pub context: Context,
    pub store: Arc<DatabaseService>,
}
