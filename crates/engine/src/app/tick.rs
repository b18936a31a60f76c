use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Point in a run at which a hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// The configured tick budget of the run.
    Final,
    Tick(u32),
}

impl Milestone {
    fn resolve(self, nticks: u32) -> u32 {
        match self {
            Self::Final => nticks,
            Self::Tick(tick) => tick,
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Final => f.write_str("final"),
            Self::Tick(tick) => write!(f, "{tick}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid milestone '{raw}': expected 'final' or a tick count")]
pub struct MilestoneParseError {
    raw: String,
}

impl FromStr for Milestone {
    type Err = MilestoneParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("final") {
            return Ok(Self::Final);
        }
        trimmed
            .parse::<u32>()
            .map(Self::Tick)
            .map_err(|_| MilestoneParseError {
                raw: raw.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
struct Hook<E> {
    milestone: Milestone,
    event: E,
    fired: bool,
}

/// Counts discrete ticks of a run and reports hooks as their milestone is reached.
///
/// Fired events are returned from [`TickHook::tick`] rather than invoked, so
/// the owner handles them once the ticker is no longer borrowed.
#[derive(Debug, Clone)]
pub struct TickHook<E> {
    nticks: u32,
    elapsed: u32,
    elapsed_seconds: f64,
    running: bool,
    hooks: Vec<Hook<E>>,
}

impl<E: Clone> TickHook<E> {
    pub fn new(nticks: u32) -> Self {
        Self {
            nticks,
            elapsed: 0,
            elapsed_seconds: 0.0,
            running: false,
            hooks: Vec::new(),
        }
    }

    pub fn add_hook(&mut self, event: E, milestone: Milestone) {
        self.hooks.push(Hook {
            milestone,
            event,
            fired: false,
        });
    }

    pub fn run(&mut self) {
        self.running = true;
    }

    /// Zeroes the counters, re-arms every hook and stops counting.
    pub fn reset(&mut self) {
        self.elapsed = 0;
        self.elapsed_seconds = 0.0;
        self.running = false;
        for hook in &mut self.hooks {
            hook.fired = false;
        }
    }

    pub fn tick(&mut self, dt: f64) -> Vec<E> {
        if !self.running {
            return Vec::new();
        }
        self.elapsed = self.elapsed.saturating_add(1);
        self.elapsed_seconds += dt;

        let mut fired = Vec::new();
        for hook in &mut self.hooks {
            if !hook.fired && hook.milestone.resolve(self.nticks) <= self.elapsed {
                hook.fired = true;
                fired.push(hook.event.clone());
            }
        }
        fired
    }

    /// Ticks counted since the last `reset()`.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn nticks(&self) -> u32 {
        self.nticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Halfway,
        Done,
    }

    fn ticks_until_fire(ticker: &mut TickHook<Event>, limit: u32) -> Vec<(u32, Event)> {
        let mut fired = Vec::new();
        for _ in 0..limit {
            for event in ticker.tick(0.01) {
                fired.push((ticker.elapsed(), event));
            }
        }
        fired
    }

    #[test]
    fn final_hook_fires_on_the_nth_tick() {
        let mut ticker = TickHook::new(100);
        ticker.add_hook(Event::Done, Milestone::Final);
        ticker.run();

        let fired = ticks_until_fire(&mut ticker, 150);
        assert_eq!(fired, vec![(100, Event::Done)]);
    }

    #[test]
    fn hooks_fire_once_per_cycle_and_rearm_on_reset() {
        let mut ticker = TickHook::new(10);
        ticker.add_hook(Event::Halfway, Milestone::Tick(5));
        ticker.add_hook(Event::Done, Milestone::Final);
        ticker.run();
        assert_eq!(
            ticks_until_fire(&mut ticker, 20),
            vec![(5, Event::Halfway), (10, Event::Done)]
        );

        ticker.reset();
        assert_eq!(ticker.elapsed(), 0);
        assert!(!ticker.is_running());
        ticker.run();
        assert_eq!(
            ticks_until_fire(&mut ticker, 10),
            vec![(5, Event::Halfway), (10, Event::Done)]
        );
    }

    #[test]
    fn tick_is_a_no_op_when_not_running() {
        let mut ticker = TickHook::new(1);
        ticker.add_hook(Event::Done, Milestone::Final);

        assert!(ticker.tick(1.0).is_empty());
        assert_eq!(ticker.elapsed(), 0);

        ticker.run();
        assert_eq!(ticker.tick(1.0), vec![Event::Done]);
        ticker.reset();
        assert!(ticker.tick(1.0).is_empty());
    }

    #[test]
    fn passed_milestone_fires_on_next_tick() {
        let mut ticker = TickHook::new(100);
        ticker.run();
        for _ in 0..7 {
            ticker.tick(0.0);
        }
        ticker.add_hook(Event::Halfway, Milestone::Tick(3));

        assert_eq!(ticker.tick(0.0), vec![Event::Halfway]);
        assert!(ticker.tick(0.0).is_empty());
    }

    #[test]
    fn dt_only_feeds_elapsed_seconds() {
        let mut ticker: TickHook<Event> = TickHook::new(3);
        ticker.run();
        ticker.tick(0.5);
        ticker.tick(10.0);

        assert_eq!(ticker.elapsed(), 2);
        assert!((ticker.elapsed_seconds() - 10.5).abs() < 1e-9);
    }

    #[test]
    fn milestone_parses_final_or_count() {
        assert_eq!("final".parse::<Milestone>().expect("final"), Milestone::Final);
        assert_eq!("42".parse::<Milestone>().expect("count"), Milestone::Tick(42));
        assert!("soon".parse::<Milestone>().is_err());
        assert!("-1".parse::<Milestone>().is_err());
        assert_eq!(Milestone::Final.to_string(), "final");
    }
}
