//! Button polling task

use embassy_time::Ticker;
use log::info;

use crate::config;
use crate::controllers::entities::LocalCommand;
use crate::infrastructure::drivers::Buttons;
use crate::infrastructure::tasks::link;

#[embassy_executor::task]
pub(crate) async fn button_task(mut buttons: Buttons<'static>) {
    let commands = link::command_sender();
    let mut ticker = Ticker::every(config::BUTTON_POLL_INTERVAL);

    loop {
        ticker.next().await;
        if let Some(event) = buttons.poll() {
            info!("buttons: {:?} pressed", event);
            // Either button toggles the power entity, mirroring a physical
            // power switch; the link session applies and publishes it
            let _ = commands.try_send(LocalCommand::TogglePower);
        }
    }
}
