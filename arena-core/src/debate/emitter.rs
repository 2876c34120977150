use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use rand::Rng;
use tracing::{debug, info, warn};

use super::event::DebateEvent;
use super::phrases::PhraseTable;
use super::plan::synthesize_plan;
use crate::config::DebateConfig;
use crate::error::ArenaError;
use crate::models::{Agent, Message};

/// Round count and pacing of a debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebateTiming {
    pub rounds: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub plan_delay: Duration,
}

impl Default for DebateTiming {
    fn default() -> Self {
        Self {
            rounds: 2,
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            plan_delay: Duration::from_millis(1000),
        }
    }
}

impl DebateTiming {
    /// No waiting at all; for tests and offline rendering.
    pub fn instant() -> Self {
        Self {
            rounds: 2,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            plan_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &DebateConfig) -> Self {
        Self {
            rounds: config.rounds,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            plan_delay: Duration::from_millis(config.plan_delay_ms),
        }
    }

    /// Uniform in `[min_delay, max_delay)`.
    pub fn message_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..max))
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Start,
    Speak(usize),
    Plan,
    End,
}

/// Counts a run as live from creation until its state is dropped.
struct LiveRun(Arc<AtomicUsize>);

impl LiveRun {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveRun {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Run {
    _live: LiveRun,
    brief: String,
    agents: Vec<Agent>,
    timing: DebateTiming,
    phrases: Arc<PhraseTable>,
    steps: VecDeque<Step>,
}

impl Run {
    fn speak(&mut self, index: usize) -> DebateEvent {
        let agent = &self.agents[index];
        match self.phrases.pick(agent.role) {
            Some(content) => {
                let message = Message::from_agent(agent, content);
                debug!(agent = %agent.id, role = %agent.role, "Agent spoke");
                DebateEvent::Message(message)
            }
            None => {
                let err = ArenaError::EmptyPhraseTable(agent.role.to_string());
                warn!(error = %err, "Aborting debate");
                self.steps.clear();
                DebateEvent::Error {
                    error: err.to_string(),
                }
            }
        }
    }
}

/// Produces the timed event sequence for one debate run. Holds no state
/// between runs.
#[derive(Debug, Clone)]
pub struct DebateEmitter {
    timing: DebateTiming,
    phrases: Arc<PhraseTable>,
    live_runs: Arc<AtomicUsize>,
}

impl Default for DebateEmitter {
    fn default() -> Self {
        Self::new(DebateTiming::default(), PhraseTable::default())
    }
}

impl DebateEmitter {
    pub fn new(timing: DebateTiming, phrases: PhraseTable) -> Self {
        Self {
            timing,
            phrases: Arc::new(phrases),
            live_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn timing(&self) -> &DebateTiming {
        &self.timing
    }

    pub fn phrases(&self) -> &PhraseTable {
        &self.phrases
    }

    /// Streams created by this emitter (or its clones) that have neither
    /// finished nor been dropped.
    pub fn active_runs(&self) -> usize {
        self.live_runs.load(Ordering::SeqCst)
    }

    /// `debate_start`, then `rounds × agents` messages in roster order, then
    /// `plan_ready` and `debate_end`. A role with no phrases ends the stream
    /// with a single `error` event. Dropping the stream cancels the run.
    pub fn stream(&self, brief: &str, agents: Vec<Agent>) -> BoxStream<'static, DebateEvent> {
        let mut steps = VecDeque::with_capacity(agents.len() * self.timing.rounds as usize + 3);
        steps.push_back(Step::Start);
        for _ in 0..self.timing.rounds {
            steps.extend((0..agents.len()).map(Step::Speak));
        }
        steps.push_back(Step::Plan);
        steps.push_back(Step::End);

        info!(
            agents = agents.len(),
            rounds = self.timing.rounds,
            "Starting debate stream"
        );

        let run = Run {
            _live: LiveRun::enter(&self.live_runs),
            brief: brief.to_string(),
            agents,
            timing: self.timing,
            phrases: Arc::clone(&self.phrases),
            steps,
        };

        stream::unfold(run, |mut run| async move {
            let step = run.steps.pop_front()?;
            let event = match step {
                Step::Start => DebateEvent::DebateStart,
                Step::Speak(index) => {
                    let delay = run.timing.message_delay();
                    tokio::time::sleep(delay).await;
                    run.speak(index)
                }
                Step::Plan => {
                    tokio::time::sleep(run.timing.plan_delay).await;
                    DebateEvent::PlanReady(synthesize_plan(&run.brief))
                }
                Step::End => {
                    info!("Debate stream finished");
                    DebateEvent::DebateEnd
                }
            };
            Some((event, run))
        })
        .boxed()
    }
}
