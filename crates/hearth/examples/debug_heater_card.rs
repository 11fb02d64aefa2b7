use hearth::{DebugConfig, DeviceMode, DeviceRecord, HeaterConfig, HeaterControlModel};
use std::thread;
use std::time::Duration;

/// This example demonstrates the heater control model with debugging
/// enabled, streaming a snapshot of every accepted control event to an
/// iggy server for inspection.
///
/// It's a modified version of the heater_card.rs example.
fn main() {
    println!("Debugging Heater Card Example");
    println!("=============================");
    println!("This example requires an iggy server running at 127.0.0.1:8090");
    println!("Subscribe to the hearth_debug/control_events topic to watch the events");
    println!();

    let record = DeviceRecord {
        temperature: 18.0,
        mode: DeviceMode::Off,
    };

    let config = HeaterConfig::new()
        .with_temperature_range(10.0, 30.0)
        .with_step(0.5);
    let step = config.step();

    // Create debug configuration
    let debug_config = DebugConfig {
        model_id: "living_room_heater".to_string(),
        sample_rate_hz: Some(10.0), // 10 Hz sampling rate
        ..Default::default()
    };

    // Create model with debugging enabled
    let mut model = HeaterControlModel::new(config, &record).with_debugging(debug_config);

    println!("Raw slider | Temperature(°C) | Gradient");
    println!("-----------|-----------------|---------");

    // Sweep the slider up and back down, 20 updates per second
    let mut raw = 10.0;
    let mut direction = 1.0;
    for _ in 0..400 {
        raw += 0.3 * direction;
        if raw >= 30.0 || raw <= 10.0 {
            direction = -direction;
        }

        model.set_temperature_from_slider(raw, step);
        println!(
            "{:10.1} | {:15.1} | {:8.3}",
            raw,
            model.temperature.get(),
            model.gradient_position.get()
        );

        thread::sleep(Duration::from_millis(50));
    }

    // Toggle the power switch a few times at the end
    for &is_on in &[true, false, true] {
        model.set_mode_from_switch(is_on);
        println!("Switch {:5} -> mode {}", is_on, model.mode.get());
        thread::sleep(Duration::from_millis(500));
    }

    println!("\nDone. Events were streamed to the hearth_debug stream.");
}
