/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
use std::env;
use vidar::{bootstrap::Application, settings::Settings};

#[tokio::main]
async fn main() -> Result<(), vidar::error::Error> {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "vidar=info");
    }
    pretty_env_logger::init();

    let settings = Settings::load()?;
    let app = Application::new(settings)?;
    app.listen_and_serve().await;
    Ok(())
}
