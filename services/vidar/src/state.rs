/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use secrecy::Secret;
use shillzzz_gungnir::Engine;
use std::sync::Arc;

use crate::auth::AdminAllowlist;

/// Shared by every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub engine: Engine,
    pub admins: Arc<AdminAllowlist>,
    pub cron_secret: Option<Secret<String>>,
}

impl AppState {
    pub fn new(engine: Engine, admins: AdminAllowlist, cron_secret: Option<Secret<String>>) -> Self {
        AppState {
            engine,
            admins: Arc::new(admins),
            cron_secret,
        }
    }
}
