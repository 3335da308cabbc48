// demos/headless.rs

use bar_stabilization_sim::clock::Clock;
use bar_stabilization_sim::{
    logger, GainLimits, Gains, MonotonicClock, SharedFrame, SharedGains, SimError, Simulation,
    SimulationConfig,
};
use log::{info, LevelFilter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), SimError> {
    logger::init(LevelFilter::Debug).expect("logger already installed");

    let config = SimulationConfig::new();
    let mut sim = Simulation::<f32>::with_config(&config)?;
    let (p, i, d) = config.initial_gains;
    let gains = SharedGains::new(Gains::new(p as f32, i as f32, d as f32));
    let mut frames = SharedFrame::new();
    let limits = GainLimits::<f32>::sliders()?;
    let running = Arc::new(AtomicBool::new(true));

    // Stand-in for the tuning sliders: stiffen the controller over time.
    let tuner = {
        let gains = gains.clone();
        let running = running.clone();
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(500));
                gains.update(|current| {
                    *current = limits.clamp(Gains::new(
                        current.p + 0.5,
                        current.i + 0.1,
                        current.d + 0.02,
                    ));
                });
            }
        })
    };

    // Stand-in for the renderer: report the newest frame a few times a second.
    let renderer = {
        let frames = frames.clone();
        let running = running.clone();
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(250));
                if let Some(frame) = frames.latest() {
                    let bounds = frame.history.plot_bounds();
                    info!(
                        "t={:.2}s angle={:.1} sp={:.0} pid=({:.2}, {:.2}, {:.2}) n={} range={:?}",
                        frame.time,
                        frame.angle,
                        frame.setpoint,
                        frame.gains.p,
                        frame.gains.i,
                        frame.gains.d,
                        frame.history.len(),
                        bounds.map(|b| (b.min, b.max)),
                    );
                }
            }
        })
    };

    let clock = MonotonicClock::new();
    let run_for = Duration::from_secs(10);
    let ticks = sim.run(&clock, &gains, &mut frames, || clock.now() >= run_for);

    running.store(false, Ordering::Relaxed);
    let _ = tuner.join();
    let _ = renderer.join();

    let ticks = ticks?;
    info!(
        "{} simulation ticks, {} frames published, final angle {:.2}",
        ticks,
        frames.published(),
        sim.plant().angle()
    );
    Ok(())
}
