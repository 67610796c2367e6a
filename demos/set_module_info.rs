//! Configures an RS01 (address, line settings, measurement parameters) and
//! then prints detections.
//!
//! ```bash
//! RUST_LOG=rs01_radar=info cargo run --example set_module_info -- /dev/ttyUSB0
//! ```

use std::env;
use std::thread;
use std::time::Duration;

use rs01_radar::registers::DEFAULT_SLAVE_ADDRESS;
use rs01_radar::{BaudRateMode, CheckBit, LogDiagnostics, Rs01, StopBit};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let port = env::args().nth(1).unwrap_or_else(|| "/dev/ttyAMA0".to_string());

    let mut sensor = Rs01::builder()
        .slave_address(DEFAULT_SLAVE_ADDRESS)
        .port(&port)
        .diagnostics(LogDiagnostics)
        .open()?;

    while !sensor.initialize() {
        println!("Please check that the device is properly connected");
        thread::sleep(Duration::from_secs(3));
    }
    println!("sensor begin successfully!!!");

    sensor.set_address(DEFAULT_SLAVE_ADDRESS);

    // stored now, used after the next power cycle
    sensor.set_baud_rate_mode(BaudRateMode::Baud115200);
    sensor.set_checkbit_stopbit(CheckBit::None, StopBit::One);

    // start 70..=6600 (<= stop), stop 70..=6600 (>= start), thresholds 100..=10000,
    // sensitivity 0..=4, offset -32768..=32767
    match sensor.set_measurement_parameters(500, 1500, 400, 200, 0x0002, -100) {
        Some(report) if report.rejected.is_empty() => println!("measurement parameters set"),
        Some(report) => println!("kept device values for {:?}", report.rejected),
        None => println!("could not read current measurement parameters"),
    }

    // sensor.restore_factory_settings();

    loop {
        if let Some(frame) = sensor.measurement_frame() {
            println!("Number of current detected targets: {}", frame.target_count);
            for (i, target) in frame.detections().iter().enumerate() {
                println!(
                    "target: {} distance: {} intensity: {}",
                    i + 1,
                    target.distance,
                    target.intensity
                );
            }
        } else {
            println!("Failed to read measurement data");
        }
        println!();
        thread::sleep(Duration::from_secs(1));
    }
}
