//! End-to-end runs of the frame loop against a mock device

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use serial_link::test_utils::{FaultKind, MockOp, MockSerialDevice};
use serial_link::{Color, SerialDevice, SerialHandler};

use riversrv::{run, Args, RiverConfig, RiverView};

fn handler(
    device: &MockSerialDevice,
    config: &RiverConfig,
) -> SerialHandler<MockSerialDevice, RiverView> {
    SerialHandler::new(device.clone(), config.channel_config().unwrap(), RiverView::new())
        .with_retry_interval(config.serial.retry_interval())
}

#[tokio::test(start_paused = true)]
async fn test_river_messages_reach_the_view() {
    let device = MockSerialDevice::new();
    device.push_incoming(b"river 1\r\nhello there\nriver 0\r\n");
    let config = RiverConfig::default();

    let shutdown = tokio::time::sleep(Duration::from_secs(1));
    let summary = run(handler(&device, &config), &config, shutdown)
        .await
        .unwrap();

    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.river.simulated(), Some(false));
    assert_eq!(summary.river.color(), Some(Color::RIVER_DRY));
    assert_eq!(summary.connection.successful_opens, 1);
    assert!(!device.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_absent_device_retried_on_interval() {
    let device = MockSerialDevice::new();
    device.set_present(false);
    let config = RiverConfig::default();

    // Attempts at 0 s, 5 s and 10 s
    let shutdown = tokio::time::sleep(Duration::from_secs(11));
    let summary = run(handler(&device, &config), &config, shutdown)
        .await
        .unwrap();

    assert_eq!(device.open_attempts(), 3);
    assert_eq!(summary.connection.failed_opens, 3);
    assert_eq!(summary.dispatched, 0);
}

#[tokio::test(start_paused = true)]
async fn test_usage_fault_stops_the_loop() {
    let device = MockSerialDevice::new();
    let config = RiverConfig::default();
    let h = handler(&device, &config);

    let device_for_fault = device.clone();
    let result = run(h, &config, async move {
        // Let the first tick open the port, then break the next access
        tokio::time::sleep(Duration::from_millis(100)).await;
        device_for_fault.fail_next(MockOp::BytesToRead, FaultKind::Usage);
        std::future::pending::<()>().await;
    })
    .await;

    assert!(result.is_err());
    // Dropped handler still closes the port
    assert!(!device.is_open());
}

#[test]
fn test_file_then_cli_precedence() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(b"serial:\n  port: /dev/ttyUSB3\n  baud_rate: 19200\nframe_rate: 30\n")
        .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let args = Args::parse_from(["riversrv", "-c", path.as_str(), "-b", "57600"]);
    let mut config = RiverConfig::load(&args.config).unwrap();
    args.apply_overrides(&mut config);
    config.validate().unwrap();

    assert_eq!(config.serial.port, "/dev/ttyUSB3");
    assert_eq!(config.serial.baud_rate, 57600);
    assert_eq!(config.frame_rate, 30);
}
