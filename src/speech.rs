//! Boundary to the text-to-speech collaborator.
//!
//! The palette code only produces strings. A [`SpeechQueue`] owns one worker
//! thread that hands those strings to a [`SpeechBackend`] one at a time, in
//! the order they were requested.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

/// Something that can say a string out loud.
pub trait SpeechBackend: Send + 'static {
    type Error: std::fmt::Display;

    /// Flushes whatever is being spoken and says `text`. Saying the same
    /// text twice must be safe.
    fn speak_now(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Commands understood by the speech worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechCommand {
    Say(String),
    Close,
}

/// Handle to the speech worker thread.
pub struct SpeechQueue {
    tx: Sender<SpeechCommand>,
    worker: Option<JoinHandle<()>>,
}

impl SpeechQueue {
    pub fn spawn<B: SpeechBackend>(backend: B) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("speech".into())
            .spawn(move || run_worker(backend, rx))?;
        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// Queues `text`. Returns `false`, and logs the lost text, if the worker
    /// is gone.
    pub fn say(&self, text: impl Into<String>) -> bool {
        match self.tx.send(SpeechCommand::Say(text.into())) {
            Ok(()) => true,
            Err(mpsc::SendError(cmd)) => {
                warn!("speech worker is gone; dropped {cmd:?}");
                false
            }
        }
    }

    /// Stops the worker after everything queued so far has been spoken.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(SpeechCommand::Close);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("speech worker panicked");
            }
        }
    }
}

impl Drop for SpeechQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<B: SpeechBackend>(mut backend: B, rx: Receiver<SpeechCommand>) {
    // a closed channel means every sender is gone
    while let Ok(cmd) = rx.recv() {
        match cmd {
            SpeechCommand::Say(text) => {
                if let Err(e) = backend.speak_now(&text) {
                    warn!("failed to speak {text:?}: {e}");
                }
            }
            SpeechCommand::Close => break,
        }
    }
    debug!("speech worker stopped");
}

/// Backend that writes utterances to stdout and the log instead of audio.
#[derive(Debug, Default)]
pub struct LogSpeaker;

impl SpeechBackend for LogSpeaker {
    type Error = std::convert::Infallible;

    fn speak_now(&mut self, text: &str) -> Result<(), Self::Error> {
        info!("speaking {text:?}");
        println!("» {text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl SpeechBackend for Recorder {
        type Error = String;

        fn speak_now(&mut self, text: &str) -> Result<(), String> {
            match text {
                "fail" => return Err("backend refused".into()),
                "crash" => panic!("backend crashed"),
                _ => {}
            }
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn speaks_in_order_then_closes() {
        let rec = Recorder::default();
        let queue = SpeechQueue::spawn(rec.clone()).unwrap();
        assert!(queue.say("Red"));
        assert!(queue.say(""));
        assert!(queue.say("fail"));
        assert!(queue.say("Red"));
        queue.close();
        assert_eq!(*rec.0.lock().unwrap(), ["Red", "", "Red"]);
    }

    #[test]
    fn say_reports_dead_worker() {
        let queue = SpeechQueue::spawn(Recorder::default()).unwrap();
        assert!(queue.say("crash"));
        let mut alive = true;
        for _ in 0..200 {
            if !queue.say("Olive") {
                alive = false;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(!alive);
    }

    #[test]
    fn drop_stops_worker() {
        let rec = Recorder::default();
        {
            let queue = SpeechQueue::spawn(rec.clone()).unwrap();
            queue.say("Teal");
        }
        assert_eq!(*rec.0.lock().unwrap(), ["Teal"]);
    }
}
