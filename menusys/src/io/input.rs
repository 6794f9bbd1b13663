//! Input collaborators: producers of [`InputEvent`]s for the engine's queue.

use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::core::types::InputEvent;
use crate::engine::EventSender;

/// A source of input events, started and stopped with the engine.
pub trait InputBackend {
    /// Begin producing events onto `events`. Called once per engine run.
    fn start(&mut self, events: EventSender) -> Result<()>;

    /// Stop producing events. Must be idempotent.
    fn stop(&mut self);
}

/// Map a typed key to an event: `i` up, `m` down, `l`/`s` select, `a` home,
/// `q` quit. Anything else is [`InputEvent::None`].
pub fn map_key(key: &str) -> InputEvent {
    match key {
        "i" => InputEvent::Up,
        "m" => InputEvent::Down,
        "l" | "s" => InputEvent::Select,
        "a" => InputEvent::Home,
        "q" => InputEvent::Quit,
        _ => InputEvent::None,
    }
}

/// Line-oriented keyboard input read on a background thread.
///
/// After each non-quit event the reader waits for the engine to acknowledge
/// it, so at most one event from this producer is ever pending. End of input
/// is treated as a quit.
pub struct KeyboardInput<R> {
    reader: Option<R>,
    exit: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyboardInput<BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send + 'static> KeyboardInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            exit: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl<R: BufRead + Send + 'static> InputBackend for KeyboardInput<R> {
    fn start(&mut self, events: EventSender) -> Result<()> {
        let Some(reader) = self.reader.take() else {
            bail!("keyboard input already started");
        };
        info!("keyboard input starting");
        let exit = Arc::clone(&self.exit);
        let handle = thread::Builder::new()
            .name("menusys-keyboard".to_string())
            .spawn(move || read_events(reader, &events, &exit))
            .context("spawn keyboard input thread")?;
        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.exit.store(true, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return;
        };
        info!("keyboard input stopping");
        if handle.is_finished() {
            if handle.join().is_err() {
                warn!("keyboard input thread panicked");
            }
        } else {
            // A thread blocked in read_line cannot be interrupted; it exits on
            // its next line once it sees the exit flag.
            debug!("keyboard input thread still blocked on read, detaching");
        }
    }
}

impl<R> Drop for KeyboardInput<R> {
    fn drop(&mut self) {
        self.exit.store(true, Ordering::SeqCst);
    }
}

fn read_events<R: BufRead>(mut reader: R, events: &EventSender, exit: &AtomicBool) {
    let mut line = String::new();
    while !exit.load(Ordering::SeqCst) {
        line.clear();
        let event = match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("input closed");
                InputEvent::Quit
            }
            Ok(_) => map_key(line.trim()),
            Err(err) => {
                warn!(err = %err, "failed to read input");
                InputEvent::Quit
            }
        };
        debug!(key = line.trim(), ?event, "keyboard event");

        if exit.load(Ordering::SeqCst) {
            break;
        }
        if event == InputEvent::Quit {
            exit.store(true, Ordering::SeqCst);
            if let Err(err) = events.send(event) {
                debug!(err = format!("{err:#}"), "engine already gone");
            }
            break;
        }
        if let Err(err) = events.send_and_wait(event) {
            debug!(err = format!("{err:#}"), "engine stopped, keyboard input exiting");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::event_queue;
    use std::io::Cursor;

    #[test]
    fn maps_keys_to_events() {
        assert_eq!(map_key("i"), InputEvent::Up);
        assert_eq!(map_key("m"), InputEvent::Down);
        assert_eq!(map_key("l"), InputEvent::Select);
        assert_eq!(map_key("s"), InputEvent::Select);
        assert_eq!(map_key("a"), InputEvent::Home);
        assert_eq!(map_key("q"), InputEvent::Quit);
        assert_eq!(map_key("j"), InputEvent::None);
        assert_eq!(map_key(""), InputEvent::None);
    }

    fn drain(input: &str) -> Vec<InputEvent> {
        let (sender, receiver) = event_queue();
        let mut keyboard = KeyboardInput::new(Cursor::new(input.as_bytes().to_vec()));
        keyboard.start(sender).expect("start");

        let mut seen = Vec::new();
        loop {
            let queued = receiver.recv().expect("event");
            let event = queued.event();
            queued.acknowledge();
            seen.push(event);
            if event == InputEvent::Quit {
                break;
            }
        }
        keyboard.stop();
        seen
    }

    #[test]
    fn reads_until_quit() {
        let seen = drain("i\nm\nl\nx\nq\ni\n");
        assert_eq!(
            seen,
            vec![
                InputEvent::Up,
                InputEvent::Down,
                InputEvent::Select,
                InputEvent::None,
                InputEvent::Quit,
            ]
        );
    }

    #[test]
    fn end_of_input_quits() {
        assert_eq!(drain("a\n"), vec![InputEvent::Home, InputEvent::Quit]);
    }

    #[test]
    fn start_twice_fails() {
        let (sender, _receiver) = event_queue();
        let mut keyboard = KeyboardInput::new(Cursor::new(Vec::new()));
        keyboard.start(sender.clone()).expect("first start");
        assert!(keyboard.start(sender).is_err());
        keyboard.stop();
        keyboard.stop();
    }
}
