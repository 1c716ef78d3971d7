use std::io;
use std::time::Instant;

use clef_format::{ClefLayer, FormatterOptions, Level, RenderedCompactJsonFormatter};
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;

fn main() {
    let options = FormatterOptions::from_env().expect("valid CLEF_* environment");
    let layer = ClefLayer::new(io::sink)
        .with_formatter(RenderedCompactJsonFormatter::new(options))
        .with_min_level(Level::Warning);
    let written = layer.written_events.clone();

    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, db.table = "orders", "custom load test error");
    }

    let elapsed = start.elapsed();
    println!("custom config: wrote {} of {} events in {:?} (~{:.0} ev/s)",
        written.load(std::sync::atomic::Ordering::Relaxed),
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
