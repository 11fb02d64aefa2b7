use hearth::{DeviceMode, DeviceRecord, DisposeBag, HeaterConfig, HeaterControlModel};
use std::cell::RefCell;
use std::rc::Rc;

/// This example drives the heater control model the way a card screen
/// would: a drag across the slider, a couple of switch toggles, and a
/// teardown that releases every binding through one dispose bag.
///
/// The "labels" are plain strings updated by driver subscriptions, and
/// the device record is written back by an external sink subscribed to
/// the model's observables.
fn main() {
    println!("Heater Card Simulation");
    println!("======================");
    println!();

    // External device record: read once at construction, written back by
    // the sink below on every accepted change.
    let record = Rc::new(RefCell::new(DeviceRecord {
        temperature: 18.0,
        mode: DeviceMode::Off,
    }));

    let config = HeaterConfig::new()
        .with_temperature_range(10.0, 30.0)
        .with_step(0.5);
    let step = config.step();

    let initial = *record.borrow();
    let mut model = HeaterControlModel::new(config, &initial);

    // One bag holds every binding of this "screen".
    let mut bag = DisposeBag::new();

    // Labels rendered by the UI layer.
    let temperature_label = Rc::new(RefCell::new(String::new()));
    let mode_label = Rc::new(RefCell::new(String::new()));

    let label = Rc::clone(&temperature_label);
    model
        .temperature_display_text
        .drive(move |text| *label.borrow_mut() = text.clone())
        .disposed_by(&mut bag);
    let label = Rc::clone(&mode_label);
    model
        .mode_display_text
        .drive(move |text| *label.borrow_mut() = text.clone())
        .disposed_by(&mut bag);

    // Writeback sink: persists accepted values into the device record.
    let sink = Rc::clone(&record);
    model
        .temperature
        .subscribe(move |t| sink.borrow_mut().temperature = *t)
        .disposed_by(&mut bag);
    let sink = Rc::clone(&record);
    model
        .mode
        .subscribe(move |m| sink.borrow_mut().mode = *m)
        .disposed_by(&mut bag);

    println!("Raw slider | {:24} | Gradient | Card", "Label");
    println!("-----------|--------------------------|----------|---------------------");

    // A drag across the slider, including values outside the bounds.
    for &raw in &[
        18.4, 19.1, 19.8, 20.6, 21.3, 22.9, 24.2, 26.8, 29.9, 31.4, 9.2,
    ] {
        model.set_temperature_from_slider(raw, step);
        let position = model.gradient_position.get();
        println!(
            "{:10.1} | {:24} | {:8.3} | {}",
            raw,
            temperature_label.borrow(),
            position,
            gradient_bar(position, 20)
        );
    }

    println!();
    for &is_on in &[true, false, true] {
        model.set_mode_from_switch(is_on);
        println!("Switch {:5} -> {}", is_on, mode_label.borrow());
    }

    println!();
    println!("Device record before teardown: {:?}", record.borrow());

    // Screen teardown: all bindings released together.
    bag.release_all();
    model.set_temperature_from_slider(15.0, step);
    println!("Device record after teardown:  {:?}", record.borrow());
    println!("Model temperature after teardown: {} °C", model.temperature.get());
}

/// ASCII rendition of the card gradient: a marker at the stop position.
fn gradient_bar(position: f64, width: usize) -> String {
    let marker = ((position * (width - 1) as f64).round() as usize).min(width - 1);
    (0..width)
        .map(|i| if i == marker { '#' } else { '-' })
        .collect()
}
