//! The event loop: a single consumer draining the input queue.
//!
//! Producers (input backends) push [`InputEvent`]s through an [`EventSender`].
//! The engine owns the navigator, the dispatcher and the display; nothing else
//! touches them. Every dequeued event is acknowledged once it has been fully
//! processed, whatever branch it took, so producers can use
//! [`EventSender::send_and_wait`] for backpressure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::core::graph::MenuGraph;
use crate::core::navigator::Navigator;
use crate::core::types::{Destination, ExecutionResult, InputEvent};
use crate::dispatch::{DispatchContext, Dispatcher};
use crate::error::DispatchError;
use crate::io::display::Display;
use crate::io::input::InputBackend;
use crate::menu::NodeKind;

/// An event waiting in the queue, with an optional acknowledgement channel.
#[derive(Debug)]
pub struct QueuedEvent {
    event: InputEvent,
    ack: Option<Sender<()>>,
}

impl QueuedEvent {
    pub fn event(&self) -> InputEvent {
        self.event
    }

    /// Tell the producer (if it is waiting) that the event was processed.
    pub fn acknowledge(self) {
        if let Some(ack) = self.ack {
            // The producer may have given up waiting.
            let _ = ack.send(());
        }
    }
}

/// Cloneable producer handle for the engine's queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<QueuedEvent>,
}

impl EventSender {
    /// Enqueue `event` without waiting.
    pub fn send(&self, event: InputEvent) -> Result<()> {
        self.tx
            .send(QueuedEvent { event, ack: None })
            .map_err(|_| anyhow!("event queue closed"))
    }

    /// Enqueue `event` and block until the engine has processed it.
    pub fn send_and_wait(&self, event: InputEvent) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.tx
            .send(QueuedEvent {
                event,
                ack: Some(ack_tx),
            })
            .map_err(|_| anyhow!("event queue closed"))?;
        ack_rx
            .recv()
            .map_err(|_| anyhow!("engine stopped before acknowledging {event:?}"))
    }
}

/// Unbounded FIFO queue shared by every producer and the engine.
pub fn event_queue() -> (EventSender, Receiver<QueuedEvent>) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, rx)
}

/// Requests a cooperative shutdown of a running engine.
///
/// Sets a flag checked between events and pushes a `Quit` sentinel on the
/// event queue, so a loop blocked on an empty queue still wakes up.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    events: EventSender,
}

impl StopHandle {
    /// Idempotent; only the first call enqueues the sentinel.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("stop requested");
        if let Err(err) = self.events.send(InputEvent::Quit) {
            debug!(err = format!("{err:#}"), "engine already gone");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct Engine<D> {
    navigator: Navigator,
    dispatcher: Dispatcher,
    display: D,
    events: Receiver<QueuedEvent>,
    sender: EventSender,
    stopped: Arc<AtomicBool>,
    last_result: Option<ExecutionResult>,
    pending_executor_id: Option<String>,
}

impl<D: Display> Engine<D> {
    /// Build an engine parked at ROOT. The returned sender feeds its queue.
    pub fn new(graph: MenuGraph, dispatcher: Dispatcher, display: D) -> (Self, EventSender) {
        let (sender, events) = event_queue();
        let engine = Self {
            navigator: Navigator::new(Arc::new(graph)),
            dispatcher,
            display,
            events,
            sender: sender.clone(),
            stopped: Arc::new(AtomicBool::new(false)),
            last_result: None,
            pending_executor_id: None,
        };
        (engine, sender)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stopped: Arc::clone(&self.stopped),
            events: self.sender.clone(),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    pub fn pending_executor_id(&self) -> Option<&str> {
        self.pending_executor_id.as_deref()
    }

    /// Run until a `Quit` event or a stop request.
    ///
    /// A [`DispatchError`] means configuration and runtime disagree; it stops
    /// the input backend and is returned.
    pub fn run(&mut self, input: &mut dyn InputBackend) -> Result<()> {
        self.navigator.home();
        self.render();
        input
            .start(self.sender.clone())
            .context("start input backend")?;
        info!(node = %self.navigator.current().id, "menu engine running");

        let outcome = self.event_loop();

        input.stop();
        self.acknowledge_unprocessed();
        if let Err(err) = self.display.cleanup() {
            warn!(err = format!("{err:#}"), "display cleanup failed");
        }
        info!("menu engine stopped");
        outcome
    }

    fn event_loop(&mut self) -> Result<()> {
        loop {
            if self.stopped.load(Ordering::SeqCst) {
                return Ok(());
            }
            let queued = self.events.recv().context("event queue closed")?;
            let event = queued.event();
            if event == InputEvent::Quit {
                queued.acknowledge();
                return Ok(());
            }
            let outcome = self.handle_event(event);
            queued.acknowledge();
            outcome.with_context(|| format!("handle {event:?}"))?;
        }
    }

    /// Release producers still waiting on events the loop will never process.
    fn acknowledge_unprocessed(&mut self) {
        let mut dropped = 0usize;
        while let Ok(queued) = self.events.try_recv() {
            queued.acknowledge();
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "acknowledged unprocessed events");
        }
    }

    /// Apply one input event: navigate, execute if an execution node became
    /// current, then render. `Quit` is the loop's business and is ignored here.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<(), DispatchError> {
        debug!(?event, node = %self.navigator.current().id, "event");
        match event {
            InputEvent::Up => self.navigator.scroll_up(),
            InputEvent::Down => self.navigator.scroll_down(),
            InputEvent::Select => {
                if let Err(err) = self.navigator.select_current() {
                    debug!(err = %err, "select ignored");
                }
            }
            InputEvent::Home => self.navigator.home(),
            InputEvent::Quit | InputEvent::None => {}
        }

        if self.navigator.current().kind == NodeKind::Execution {
            self.execute_current()?;
        }
        self.render();
        Ok(())
    }

    fn execute_current(&mut self) -> Result<(), DispatchError> {
        self.last_result = None;

        let node = self.navigator.current();
        let executor_id = node
            .executor_id
            .clone()
            .unwrap_or_else(|| unreachable!("execution node {} without executor id", node.id));

        if node.requires_confirmation {
            info!(node = %node.id, executor = %executor_id, "awaiting confirmation");
            self.pending_executor_id = Some(executor_id);
            self.navigator.go_to_confirmation();
            return Ok(());
        }

        let saved = self.pending_executor_id.take();
        let ctx = DispatchContext::new(saved, &self.dispatcher);
        let result = self.dispatcher.execute(&executor_id, &ctx)?;

        match result.destination {
            Destination::LastSelectionMenu => self.navigator.go_to_last_selection_menu(),
            Destination::PostExecuteOutput => self.navigator.go_to_post_execute_output(),
            Destination::Home | Destination::Confirmation => self.navigator.home(),
        }
        self.last_result = Some(result);
        Ok(())
    }

    fn render(&mut self) {
        let node = self.navigator.current();
        let outcome = match node.kind {
            NodeKind::Selection => self.display.render_menu(node, self.navigator.cursor()),
            NodeKind::Output => {
                let text = self.last_result.as_ref().map_or("", |r| r.output.as_str());
                self.display.render_output(node, text)
            }
            NodeKind::Execution => return,
        };
        if let Err(err) = outcome {
            warn!(node = %node.id, err = format!("{err:#}"), "display failed");
        }
    }
}
