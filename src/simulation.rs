// src/simulation.rs

//! # Multi-Rate Simulation Driver
//!
//! Ties the plant, controller, disturbances, setpoints and history together
//! behind a single cooperative loop. Each call to [`Simulation::poll`] reads
//! one clock value and runs whichever cadences are due, always in the order
//! simulation, control, setpoint advance, display. Nothing blocks and nothing
//! runs concurrently inside the loop; the only seams to the outside world are
//! a [`GainSource`] sampled at the top of every simulation tick and a
//! [`FrameSink`] fed on every display tick.
//!
//! ## Tick contents
//!
//! - **Simulation:** sample gains, apply disturbances, integrate the plant
//!   once over the observed delta, record `(time, angle, setpoint)`, prune
//!   the history window.
//! - **Control:** measure the angle with uniform noise, run the PID over the
//!   observed control delta, scale and saturate the effort, and add it to the
//!   plant's angular velocity. The effort takes effect on the next
//!   simulation tick.
//! - **Display:** snapshot the history and hand a [`Frame`] to the sink.

use crate::clock::{Clock, Scheduler, Ticks};
use crate::controller::{AngleController, Gains};
use crate::disturbance::DisturbanceInjector;
use crate::history::{HistoryBuffer, HistorySnapshot};
use crate::plant::PlantModel;
use crate::setpoint::SetpointSequencer;
use crate::{Number, SimError, SimulationConfig};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on the samples reserved up front for the history window.
const MAX_PREALLOCATED_SAMPLES: usize = 1 << 16;

/// Supplies the gains for the next simulation tick.
pub trait GainSource<T> {
    /// Current gains. Called once per simulation tick.
    fn gains(&self) -> Gains<T>;
}

impl<T: Number> GainSource<T> for Gains<T> {
    fn gains(&self) -> Gains<T> {
        *self
    }
}

/// Everything the rendering collaborator needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T> {
    /// Seconds since the start of the simulation. Subject to the same
    /// range limits as [`HistorySample::time`](crate::history::HistorySample::time).
    pub time: T,
    /// Bar angle in degrees, for drawing its orientation.
    pub angle: T,
    /// Active target angle in degrees.
    pub setpoint: T,
    /// Gains in effect.
    pub gains: Gains<T>,
    /// The history window at the time of the frame.
    pub history: Arc<HistorySnapshot<T>>,
}

/// Consumes frames produced on the display cadence.
pub trait FrameSink<T> {
    /// Receives one frame.
    fn present(&mut self, frame: &Frame<T>);
}

/// What happened during one call to [`Simulation::poll`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport<T> {
    /// Cadences that fired and their observed deltas.
    pub ticks: Ticks,
    /// Saturated control effort applied, if the control cadence fired.
    pub effort: Option<T>,
    /// Whether the impulse disturbance fired.
    pub impulse_fired: bool,
    /// Whether the setpoint advanced.
    pub setpoint_changed: bool,
    /// Frame produced, if the display cadence fired.
    pub frame: Option<Frame<T>>,
}

/// The drone bar together with its controller and environment.
pub struct Simulation<T: Number = f32> {
    scheduler: Scheduler,
    plant: PlantModel<T>,
    controller: AngleController<T>,
    disturbance: DisturbanceInjector<T>,
    setpoints: SetpointSequencer<T>,
    history: HistoryBuffer<T>,
    history_window: T,
    gains: Gains<T>,
    effort_scale: T,
    effort_limit: T,
    noise_amplitude: f64,
    rng: StdRng,
}

impl<T: Number> Simulation<T> {
    /// Builds a simulation whose clocks start at zero.
    pub fn with_config(config: &SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        let start = Duration::ZERO;

        let scheduler = Scheduler::new(
            config.simulation_period,
            config.control_period,
            config.display_period,
            start,
        )?;
        let plant = PlantModel::new(
            T::convert("initial angle", config.initial_angle)?,
            T::convert("initial angular velocity", config.initial_angular_velocity)?,
        );
        let controller =
            AngleController::new(T::convert("integral limit", config.integral_limit)?)?;
        let disturbance = DisturbanceInjector::new(
            T::convert("constant disturbance", config.constant_disturbance)?,
            T::convert("impulse disturbance", config.impulse_disturbance)?,
            config.impulse_interval,
            start,
        )?;
        let setpoints = SetpointSequencer::new(
            config
                .setpoints
                .iter()
                .map(|&value| T::convert("setpoint", value))
                .collect::<Result<Vec<_>, _>>()?,
            config.setpoint_start_index,
            config.setpoint_interval,
            start,
        )?;
        let (p, i, d) = config.initial_gains;
        let gains = Gains::new(
            T::convert("p gain", p)?,
            T::convert("i gain", i)?,
            T::convert("d gain", d)?,
        );
        let rng = match config.noise_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        // Float to int casts saturate, so a huge window only hits the cap.
        let samples = (config.history_window / config.simulation_period.as_secs_f64()).ceil();
        let capacity = (samples as usize)
            .saturating_add(1)
            .min(MAX_PREALLOCATED_SAMPLES);

        info!(
            "simulation ready: {:?} simulation, {:?} control, {:?} display, {} setpoints",
            config.simulation_period,
            config.control_period,
            config.display_period,
            config.setpoints.len()
        );

        Ok(Simulation {
            scheduler,
            plant,
            controller,
            disturbance,
            setpoints,
            history: HistoryBuffer::with_capacity(capacity),
            history_window: T::convert("history window", config.history_window)?,
            gains,
            effort_scale: T::convert("effort scale", config.effort_scale)?,
            effort_limit: T::convert("effort limit", config.effort_limit)?,
            noise_amplitude: config.noise_amplitude,
            rng,
        })
    }

    /// Runs every cadence that is due at `now`.
    pub fn poll<G: GainSource<T>>(
        &mut self,
        now: Duration,
        gains: &G,
    ) -> Result<PollReport<T>, SimError> {
        let ticks = self.scheduler.poll(now);
        let mut report = PollReport {
            ticks,
            effort: None,
            impulse_fired: false,
            setpoint_changed: false,
            frame: None,
        };

        if let Some(dt) = ticks.simulation {
            report.impulse_fired = self.simulate(now, dt, gains.gains())?;
        }
        if let Some(dt) = ticks.control {
            report.effort = Some(self.control(dt)?);
        }
        report.setpoint_changed = self.setpoints.update(now);
        if ticks.display.is_some() {
            report.frame = Some(self.frame(now)?);
        }
        Ok(report)
    }

    /// Polls `clock` until `should_stop` returns true.
    ///
    /// Frames are handed to `sink` as they are produced. Returns the number
    /// of simulation ticks executed.
    pub fn run<C, G, S>(
        &mut self,
        clock: &C,
        gains: &G,
        sink: &mut S,
        mut should_stop: impl FnMut() -> bool,
    ) -> Result<u64, SimError>
    where
        C: Clock,
        G: GainSource<T>,
        S: FrameSink<T>,
    {
        info!("simulation loop started at {:?}", clock.now());
        let mut simulation_ticks = 0;
        while !should_stop() {
            let report = self.poll(clock.now(), gains)?;
            if report.ticks.simulation.is_some() {
                simulation_ticks += 1;
            }
            if let Some(frame) = &report.frame {
                sink.present(frame);
            }
            if report.ticks.is_idle() {
                std::thread::yield_now();
            }
        }
        info!(
            "simulation loop stopped at {:?} after {} ticks",
            clock.now(),
            simulation_ticks
        );
        Ok(simulation_ticks)
    }

    fn simulate(
        &mut self,
        now: Duration,
        dt: Duration,
        gains: Gains<T>,
    ) -> Result<bool, SimError> {
        let dt = T::seconds("simulation step", dt)?;
        let time = T::seconds("time", now)?;
        self.gains = gains;

        let impulse_fired = self.disturbance.apply(&mut self.plant, now);
        self.plant.integrate(dt);

        self.history.append(time, self.plant.angle(), self.setpoints.current());
        self.history.prune(time, self.history_window);
        Ok(impulse_fired)
    }

    fn control(&mut self, dt: Duration) -> Result<T, SimError> {
        let dt = T::seconds("control step", dt)?;
        let noise = if self.noise_amplitude > 0.0 {
            self.rng
                .random_range(-self.noise_amplitude..=self.noise_amplitude)
        } else {
            0.0
        };
        let measured = self.plant.angle() + T::convert("noise", noise)?;
        let target = self.setpoints.current();

        let output = self.controller.compute(self.gains, target, measured, dt)?;
        let scaled = self.effort_scale * output;
        let effort = scaled.clamp(-self.effort_limit, self.effort_limit);
        if effort != scaled {
            debug!("control effort {:?} saturated to {:?}", scaled, effort);
        }
        trace!(
            "control: target {:?}, measured {:?}, dt {:?}, effort {:?}",
            target,
            measured,
            dt,
            effort
        );

        self.plant.apply_angular_velocity_delta(effort);
        Ok(effort)
    }

    fn frame(&self, now: Duration) -> Result<Frame<T>, SimError> {
        Ok(Frame {
            time: T::seconds("time", now)?,
            angle: self.plant.angle(),
            setpoint: self.setpoints.current(),
            gains: self.gains,
            history: Arc::new(self.history.snapshot()),
        })
    }

    /// The bar.
    pub fn plant(&self) -> &PlantModel<T> {
        &self.plant
    }

    /// The angle controller.
    pub fn controller(&self) -> &AngleController<T> {
        &self.controller
    }

    /// The recorded history window.
    pub fn history(&self) -> &HistoryBuffer<T> {
        &self.history
    }

    /// The setpoint sequencer.
    pub fn setpoints(&self) -> &SetpointSequencer<T> {
        &self.setpoints
    }

    /// The disturbance injector.
    pub fn disturbance(&self) -> &DisturbanceInjector<T> {
        &self.disturbance
    }

    /// Gains sampled on the latest simulation tick.
    pub fn gains(&self) -> Gains<T> {
        self.gains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::test_utils::*;

    /// Bar at 10 degrees, no noise, no disturbances, level target.
    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::new();
        config.initial_angle = 10.0;
        config.noise_amplitude = 0.0;
        config.constant_disturbance = 0.0;
        config.impulse_disturbance = 0.0;
        config.setpoints = vec![0.0];
        config.setpoint_start_index = 0;
        config.effort_scale = 1.0;
        config.initial_gains = (1.0, 0.0, 0.0);
        config
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[derive(Default)]
    struct CollectingSink {
        frames: Vec<Frame<f32>>,
    }

    impl FrameSink<f32> for CollectingSink {
        fn present(&mut self, frame: &Frame<f32>) {
            self.frames.push(frame.clone());
        }
    }

    /// Test the first control tick on a 10 degree deflection.
    #[test]
    fn test_simulation_first_control_effort() {
        let mut config = quiet_config();
        config.control_period = ms(100);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();
        let gains = Gains::new(1.0, 0.0, 0.0);

        let report = sim.poll(ms(100), &gains).unwrap();
        assert_eq!(Some(ms(100)), report.ticks.simulation);
        assert_eq!(Some(ms(100)), report.ticks.control);
        assert!(value_close(-10.0, report.effort.unwrap()), "Effort should be -10.");
        assert!(value_close(10.0, sim.plant().angle()));
        assert!(value_close(-10.0, sim.plant().angular_velocity()));

        // The effort moves the bar on the next simulation tick.
        sim.poll(ms(110), &gains).unwrap();
        assert!(value_close(9.9, sim.plant().angle()));
    }

    /// Test that simulation completes before control within one poll.
    #[test]
    fn test_simulation_tick_order() {
        let mut config = quiet_config();
        config.initial_angular_velocity = 50.0;
        config.control_period = ms(100);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();

        // The angle integrates to 15 before the controller measures it.
        let report = sim.poll(ms(100), &Gains::new(1.0, 0.0, 0.0)).unwrap();
        assert!(value_close(-15.0, report.effort.unwrap()));
    }

    /// Test that the effort is scaled and then saturated.
    #[test]
    fn test_simulation_effort_saturation() {
        let mut config = quiet_config();
        config.initial_angle = 90.0;
        config.effort_scale = 1.5;
        config.effort_limit = 120.0;
        config.control_period = ms(100);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();

        let report = sim.poll(ms(100), &Gains::new(50.0, 0.0, 0.0)).unwrap();
        assert!(value_close(-120.0, report.effort.unwrap()));

        let report = sim.poll(ms(200), &Gains::new(0.5, 0.0, 0.0)).unwrap();
        // The bar moved 12 degrees, leaving 78 * 0.5 * 1.5.
        assert!(value_close(-58.5, report.effort.unwrap()));
    }

    /// Test that gains are sampled on simulation ticks only.
    #[test]
    fn test_simulation_gain_sampling() {
        let mut config = quiet_config();
        config.simulation_period = ms(50);
        config.control_period = ms(10);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();

        sim.poll(ms(10), &Gains::new(7.0, 0.0, 0.0)).unwrap();
        assert_eq!(Gains::new(1.0, 0.0, 0.0), sim.gains(), "No simulation tick yet.");

        sim.poll(ms(50), &Gains::new(7.0, 0.0, 0.0)).unwrap();
        assert_eq!(Gains::new(7.0, 0.0, 0.0), sim.gains());
    }

    /// Test the constant disturbance and the impulse schedule.
    #[test]
    fn test_simulation_disturbances() {
        let mut config = quiet_config();
        config.initial_angle = 0.0;
        config.constant_disturbance = 8.0;
        config.impulse_disturbance = 200.0;
        config.control_period = Duration::from_secs(60);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();
        let gains = Gains::new(0.0, 0.0, 0.0);

        let mut impulses = Vec::new();
        for millis in (10..=17000).step_by(10) {
            if sim.poll(ms(millis), &gains).unwrap().impulse_fired {
                impulses.push(millis);
            }
        }
        assert_eq!(vec![8010, 16020], impulses);
        assert!(value_close(
            1700.0 * 8.0 + 2.0 * 200.0,
            sim.plant().angular_velocity()
        ));
    }

    /// Test the setpoint cycle as seen in the recorded history.
    #[test]
    fn test_simulation_setpoint_history() {
        let mut config = SimulationConfig::new();
        config.noise_seed = Some(1);
        config.history_window = 10.0;
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();
        let gains = Gains::new(1.0, 0.0, 0.05);

        let mut changes = 0;
        for millis in 1..=6500 {
            if sim.poll(ms(millis), &gains).unwrap().setpoint_changed {
                changes += 1;
            }
        }
        assert_eq!(3, changes);
        assert_eq!(1, sim.setpoints().index(), "Three changes wrap to the start.");

        let setpoint_at = |time: f32| {
            sim.history()
                .iter()
                .find(|sample| value_close(time, sample.time))
                .map(|sample| sample.setpoint)
        };
        assert_eq!(Some(0.0), setpoint_at(1.0));
        assert_eq!(Some(30.0), setpoint_at(3.0));
        assert_eq!(Some(-30.0), setpoint_at(5.0));
    }

    /// Test that the history holds the trailing window at the simulation rate.
    #[test]
    fn test_simulation_history_window() {
        let mut config = SimulationConfig::new();
        config.noise_seed = Some(3);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();
        let gains = Gains::new(1.0, 0.0, 0.05);

        for millis in 1..=10_000 {
            sim.poll(ms(millis), &gains).unwrap();
        }
        let history = sim.history();
        let latest = history.latest().unwrap();
        assert!(value_close(10.0, latest.time));
        assert!(history.iter().all(|sample| latest.time - sample.time <= 5.0));
        assert!((500..=501).contains(&history.len()));
        assert!(value_close(sim.plant().angle(), latest.angle));
    }

    /// Test that display frames carry a snapshot including the latest sample.
    #[test]
    fn test_simulation_frames() {
        let mut config = quiet_config();
        config.display_period = ms(20);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();
        let gains = Gains::new(1.0, 0.0, 0.0);

        assert!(sim.poll(ms(10), &gains).unwrap().frame.is_none());
        let frame = sim.poll(ms(20), &gains).unwrap().frame.unwrap();

        assert!(value_close(0.02, frame.time));
        assert!(value_close(sim.plant().angle(), frame.angle));
        assert_eq!(2, frame.history.len());
        assert_eq!(sim.history().latest(), frame.history.latest());
    }

    /// Test that seeded runs replay bit for bit.
    #[test]
    fn test_simulation_seeded_replay() {
        let run = || {
            let mut config = SimulationConfig::new();
            config.noise_seed = Some(42);
            let mut sim = Simulation::<f32>::with_config(&config).unwrap();
            let gains = Gains::new(3.0, 1.0, 0.2);
            for millis in (1..=3000).step_by(3) {
                sim.poll(ms(millis), &gains).unwrap();
            }
            sim.history()
                .iter()
                .map(|sample| sample.angle.to_bits())
                .collect::<Vec<u32>>()
        };
        let first = run();
        assert!(!first.is_empty());
        assert_eq!(first, run());
    }

    /// Test that noise perturbs the measurement within its amplitude.
    #[test]
    fn test_simulation_noise_bounded() {
        let mut config = quiet_config();
        config.noise_amplitude = 0.1;
        config.noise_seed = Some(9);
        config.control_period = ms(100);
        config.simulation_period = Duration::from_secs(60);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();

        let report = sim.poll(ms(100), &Gains::new(1.0, 0.0, 0.0)).unwrap();
        let effort = report.effort.unwrap();
        assert!((-10.1..=-9.9).contains(&effort));
    }

    /// Test the cooperative loop against a manual clock.
    #[test]
    fn test_simulation_run_loop() {
        let mut config = SimulationConfig::new();
        config.noise_seed = Some(5);
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();
        let clock = ManualClock::new();
        let mut sink = CollectingSink::default();

        let ticks = sim
            .run(&clock, &Gains::new(1.0, 0.0, 0.05), &mut sink, || {
                clock.advance(ms(1));
                clock.now() > Duration::from_secs(1)
            })
            .unwrap();

        assert_eq!(100, ticks);
        // 60 Hz display fires every 17ms at 1ms resolution.
        assert_eq!(58, sink.frames.len());
        assert!(sink
            .frames
            .windows(2)
            .all(|pair| pair[0].time < pair[1].time));
    }

    /// Test that an oversized history window builds without reserving it all.
    #[test]
    fn test_simulation_large_history_window() {
        let mut config = quiet_config();
        config.history_window = 1.0e15;
        let mut sim = Simulation::<f32>::with_config(&config).unwrap();
        sim.poll(ms(10), &Gains::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(1, sim.history().len());

        config.history_window = f64::INFINITY;
        assert_eq!(
            Some(SimError::InvalidParameter {
                name: "history window",
                value: f64::INFINITY
            }),
            Simulation::<f32>::with_config(&config).err()
        );
    }

    /// Test that infinite noise is refused before the first control tick.
    #[test]
    fn test_simulation_infinite_noise_refused() {
        let mut config = quiet_config();
        config.noise_amplitude = f64::INFINITY;
        assert!(matches!(
            Simulation::<f32>::with_config(&config),
            Err(SimError::InvalidParameter {
                name: "noise amplitude",
                ..
            })
        ));
    }

    /// Test that an invalid configuration is refused.
    #[test]
    fn test_simulation_invalid_config() {
        let mut config = SimulationConfig::new();
        config.setpoints.clear();
        assert_eq!(
            Some(SimError::EmptySetpoints),
            Simulation::<f32>::with_config(&config).err()
        );
    }
}
