//! Single-writer view controller
//!
//! A [`ViewController`] runs one reducer task per view. Every state change
//! goes through that task's message queue, so at most one transition is
//! computed at a time while any number of requests, polls and feed
//! subscriptions run concurrently around it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cm_core::Seq;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::seq::Sequencer;
use crate::state::ViewState;

/// A message plus the sequence number it was issued or received at
#[derive(Debug)]
pub struct Envelope<M> {
    pub seq: Seq,
    pub msg: M,
}

/// State transition logic for one kind of view
pub trait Reducer: Send + 'static {
    type Data: Clone + Send + Sync + 'static;
    type Msg: Send + 'static;

    /// Message that triggers a (re)load
    fn load_message() -> Self::Msg;

    fn reduce(
        &mut self,
        state: &mut ViewState<Self::Data>,
        envelope: Envelope<Self::Msg>,
        handle: &ViewHandle<Self::Msg>,
    );
}

/// Cloneable handle for feeding messages to a view and spawning its work
pub struct ViewHandle<M> {
    name: &'static str,
    tx: mpsc::UnboundedSender<Envelope<M>>,
    sequencer: Arc<Sequencer>,
    token: CancellationToken,
}

impl<M> Clone for ViewHandle<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            sequencer: self.sequencer.clone(),
            token: self.token.clone(),
        }
    }
}

impl<M: Send + 'static> ViewHandle<M> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Enqueue with a fresh sequence number
    pub fn send(&self, msg: M) -> Seq {
        let seq = self.sequencer.next();
        self.send_at(seq, msg);
        seq
    }

    /// Enqueue with a sequence number assigned earlier, at issue time
    pub fn send_at(&self, seq: Seq, msg: M) {
        if self.token.is_cancelled() {
            return;
        }
        if self.tx.send(Envelope { seq, msg }).is_err() {
            debug!(view = self.name, seq, "view closed, message dropped");
        }
    }

    /// Run `task` until it completes or the view is torn down
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = task => {}
            }
        });
    }

    /// Await `request` in the background and deliver its output stamped `seq`
    pub fn request<T, F, W>(&self, seq: Seq, request: F, wrap: W)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
        W: FnOnce(T) -> M + Send + 'static,
    {
        let handle = self.clone();
        self.spawn(async move {
            let output = request.await;
            handle.send_at(seq, wrap(output));
        });
    }

    /// Enqueue `make()` every `period`, starting one period from now
    pub fn every<F>(&self, period: Duration, make: F)
    where
        F: Fn() -> M + Send + 'static,
    {
        let handle = self.clone();
        self.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(view = handle.name, "poll tick");
                handle.send(make());
            }
        });
    }
}

/// Owner of a running view: its reducer task, state channel and
/// cancellation scope. Dropping the controller cancels the view.
pub struct ViewController<R: Reducer> {
    handle: ViewHandle<R::Msg>,
    state: watch::Receiver<ViewState<R::Data>>,
    task: Option<JoinHandle<()>>,
}

impl<R: Reducer> ViewController<R> {
    /// Spawn the reducer task without triggering a load
    pub fn spawn(name: &'static str, reducer: R) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ViewState::default());
        let handle = ViewHandle {
            name,
            tx,
            sequencer: Arc::new(Sequencer::new()),
            token: CancellationToken::new(),
        };

        let task = tokio::spawn(run(reducer, rx, state_tx, handle.clone()));
        info!(view = name, "view started");

        Self {
            handle,
            state: state_rx,
            task: Some(task),
        }
    }

    /// Spawn and immediately trigger the initial load
    pub fn start(name: &'static str, reducer: R) -> Self {
        let controller = Self::spawn(name, reducer);
        controller.handle.send(R::load_message());
        controller
    }

    pub fn name(&self) -> &'static str {
        self.handle.name
    }

    pub fn handle(&self) -> &ViewHandle<R::Msg> {
        &self.handle
    }

    /// User-initiated reload
    pub fn retry(&self) {
        self.handle.send(R::load_message());
    }

    pub fn snapshot(&self) -> ViewState<R::Data> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<R::Data>> {
        self.state.clone()
    }

    /// Wait until a published state satisfies `predicate`.
    ///
    /// Returns `None` if the view stops first.
    pub async fn wait_for<F>(&self, predicate: F) -> Option<ViewState<R::Data>>
    where
        F: FnMut(&ViewState<R::Data>) -> bool,
    {
        let mut receiver = self.state.clone();
        let state = receiver.wait_for(predicate).await.ok().map(|state| state.clone());
        state
    }

    pub fn is_torn_down(&self) -> bool {
        self.handle.token.is_cancelled()
    }

    /// Cancel all work and wait for the reducer to stop. The last published
    /// state stays readable and never changes afterwards.
    pub async fn teardown(&mut self) {
        self.handle.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(view = self.handle.name, error = %e, "reducer task failed");
            }
        }
        info!(view = self.handle.name, "view torn down");
    }
}

impl<R: Reducer> Drop for ViewController<R> {
    fn drop(&mut self) {
        self.handle.token.cancel();
    }
}

async fn run<R: Reducer>(
    mut reducer: R,
    mut rx: mpsc::UnboundedReceiver<Envelope<R::Msg>>,
    state_tx: watch::Sender<ViewState<R::Data>>,
    handle: ViewHandle<R::Msg>,
) {
    let mut state = ViewState::default();

    loop {
        let envelope = tokio::select! {
            biased;
            _ = handle.token.cancelled() => break,
            next = rx.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let seq = envelope.seq;
        reducer.reduce(&mut state, envelope, &handle);
        state.last_seq = state.last_seq.max(seq);

        if handle.token.is_cancelled() {
            break;
        }
        state_tx.send_replace(state.clone());
    }

    rx.close();
    debug!(view = handle.name, "reducer stopped");
}
