//! Polls an RS01 and prints its identity, configuration and detected targets.
//!
//! ```bash
//! RUST_LOG=rs01_radar=info cargo run --example get_module_info -- /dev/ttyUSB0 14
//! ```

use std::env;
use std::thread;
use std::time::Duration;

use rs01_radar::registers::DEFAULT_SLAVE_ADDRESS;
use rs01_radar::{LogDiagnostics, Rs01};

fn bar(value: u16, mark: char) -> String {
    std::iter::repeat_n(mark, (value as usize).div_ceil(20)).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let port = args.get(1).map(|s| s.as_str()).unwrap_or("/dev/ttyAMA0");
    let slave: u8 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SLAVE_ADDRESS);

    let mut sensor = Rs01::builder()
        .slave_address(slave)
        .port(port)
        .diagnostics(LogDiagnostics)
        .open()?;

    while !sensor.initialize() {
        println!("Please check that the device is properly connected");
        thread::sleep(Duration::from_secs(3));
    }
    println!("sensor begin successfully!!!");

    loop {
        println!();
        match sensor.basic_info() {
            Some(info) => {
                println!("PID: {:#x}", info.pid);
                println!("VID: {:#x}", info.vid);
                println!("mailing address: {:#x}", info.slave_address);
                match info.baud_rate() {
                    Some(mode) => println!("baudrate: {}", mode.bits_per_second()),
                    None => println!("baudrate: unknown code {:#x}", info.baud_rate_code),
                }
                println!("check bit: {:?}", info.check_bit());
                println!("stop bit: {:?}", info.stop_bit());
                let [a, b, c, d] = info.version_parts();
                println!("versions: V{a}.{b}.{c}.{d}");
            }
            None => println!("Failed to read basic information"),
        }
        println!();

        match sensor.measurement_config() {
            Some(config) => {
                println!("starting position: {}", config.start_position);
                println!("stop position: {}", config.stop_position);
                println!("initial threshold: {}", config.start_threshold);
                println!("end threshold: {}", config.end_threshold);
                println!("module sensitivity: {}", config.sensitivity);
                println!("comparison offset: {}", config.comparison_offset);
            }
            None => println!("Failed to read measurement config"),
        }
        println!();

        match sensor.measurement_frame() {
            Some(frame) => {
                println!("Number of current detected targets: {}", frame.target_count);
                for (i, target) in frame.detections().iter().enumerate() {
                    let n = i + 1;
                    let distance = target.distance;
                    let intensity = target.intensity;
                    println!("target: {n} distance: {distance}: {}", bar(distance, '-'));
                    println!("target: {n} intensity: {intensity}: {}", bar(intensity, '+'));
                }
            }
            None => println!("Failed to read measurement data"),
        }

        thread::sleep(Duration::from_secs(1));
    }
}
