use std::io;
use std::time::Instant;

use chrono::Utc;
use clef_format::{CompactJsonFormatter, EventFormatter, Level, LogEvent, MessageTemplate};

fn main() {
    let formatter = CompactJsonFormatter::default();
    let template = MessageTemplate::parse("Handled {Route} in {Elapsed:0.000} ms");
    let mut sink = io::sink();

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let event = LogEvent::new(Utc::now(), Level::Error, template.clone())
            .with_property("Route", "/orders")
            .with_property("Elapsed", i as f64 / 7.0)
            .with_property("http.status_code", 500)
            .with_property("iteration", i);
        formatter
            .format(&event, &mut sink)
            .expect("io::sink never fails");
    }

    let elapsed = start.elapsed();
    println!("default config: formatted {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
