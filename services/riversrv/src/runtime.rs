//! Frame loop
//!
//! Ticks the serial handler at the configured frame rate, blinks the LED when
//! enabled, and tears the link down once the shutdown future resolves.

use std::future::Future;

use anyhow::{Context, Result};
use serial_link::{ConnectionStats, SerialDevice, SerialHandler, TickOutcome};
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::RiverConfig;
use crate::light::LightController;
use crate::river::RiverView;

/// Counters reported when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub dispatched: u64,
    pub rejected: u64,
    pub connection: ConnectionStats,
    pub river: RiverView,
    /// Power light state at shutdown
    pub light_on: bool,
}

/// Run until `shutdown` resolves. A usage fault from the link stops the loop
/// with an error; the handler still closes the port when dropped.
pub async fn run<D, F>(
    mut handler: SerialHandler<D, RiverView>,
    config: &RiverConfig,
    shutdown: F,
) -> Result<RunSummary>
where
    D: SerialDevice,
    F: Future<Output = ()>,
{
    let mut frames = interval(config.frame_interval());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut blink = config.light.blink_interval().map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });
    let mut light = LightController::default();

    let mut summary = RunSummary::default();
    tokio::pin!(shutdown);

    info!(
        "River link on {} @ {} baud, {} fps",
        config.serial.port, config.serial.baud_rate, config.frame_rate
    );

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            now = frames.tick() => {
                summary.ticks += 1;
                match handler.tick(now.into_std()).context("Serial link failed")? {
                    TickOutcome::Dispatched(command) => {
                        debug!("Applied {:?}", command);
                        summary.dispatched += 1;
                    },
                    TickOutcome::Rejected(_) => summary.rejected += 1,
                    TickOutcome::Idle | TickOutcome::Disconnected => {},
                }
            },
            () = next_blink(&mut blink) => {
                let on = light.toggle();
                debug!("Power light {}", light.color());
                handler.send_led(on).context("Failed to send LED state")?;
            },
        }
    }

    summary.connection = handler.stats();
    summary.river = handler.river().clone();
    summary.light_on = light.is_on();
    handler.teardown();

    info!(
        "River link closed after {} ticks ({} applied, {} rejected, {} opens)",
        summary.ticks, summary.dispatched, summary.rejected, summary.connection.successful_opens
    );
    Ok(summary)
}

async fn next_blink(blink: &mut Option<Interval>) {
    match blink {
        Some(ticker) => {
            ticker.tick().await;
        },
        None => std::future::pending().await,
    }
}
