//! Headless flocking run.
//!
//! Steps a seeded flock for a few simulated seconds and logs flock statistics.
//! Set `RUST_LOG=quadflock=debug` to see per-tick index activity.
//!
//! ```text
//! cargo run --release --example flock -- dynamic
//! ```

use quadflock::prelude::*;
use tracing::info;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<(), FlockError> {
    init_tracing();

    let index = match std::env::args().nth(1).as_deref() {
        Some("dynamic") => IndexChoice::DYNAMIC,
        _ => IndexChoice::STATIC,
    };
    let config = SimulationConfig {
        agent_count: 2_000,
        index,
        seed: Some(7),
        ..SimulationConfig::default()
    };
    let mut sim = FlockingSimulator::new(config)?;

    let dt = 1.0 / 60.0;
    for second in 1..=10 {
        let mut deferred = 0;
        for _ in 0..60 {
            deferred += sim.tick(dt)?.deferred_updates;
        }

        // Mean heading length is 1 for a perfectly aligned flock and near 0 for a disordered one.
        let count = sim.transforms().len().max(1) as f32;
        let order = sim.transforms().map(|(_, heading)| heading).sum::<Vec2>().length() / count;
        let mut nodes = 0;
        let mut deepest = 0;
        sim.visit_index_bounds(|_, depth| {
            nodes += 1;
            deepest = deepest.max(depth);
        });
        info!(second, order, nodes, deepest, deferred, "flock status");
    }
    Ok(())
}
