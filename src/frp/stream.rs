use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::cell::{Cell, CellLoop};
use super::{Listener, Transaction};

pub(crate) struct StreamNode<T> {
    listeners: RefCell<Vec<Weak<dyn Fn(&T)>>>,
    /// Above the rank of every stream feeding this one
    rank: std::cell::Cell<u64>,
    /// Upstream handles and the listeners registered on them on our behalf
    keep_alive: RefCell<Vec<Box<dyn Any>>>,
}

impl<T> StreamNode<T> {
    fn fire(&self, value: &T) {
        let live: Vec<Rc<dyn Fn(&T)>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|listener| listener.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            listener(value);
        }
    }
}

/// A sequence of discrete events.
///
/// Listeners are held weakly by the stream; whoever derives from a stream
/// keeps the registration alive.
pub struct Stream<T> {
    node: Rc<StreamNode<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            node: self.node.clone(),
        }
    }
}

impl<T: 'static> Stream<T> {
    pub(crate) fn new() -> Self {
        Self::with_rank(0)
    }

    pub(crate) fn with_rank(rank: u64) -> Self {
        Stream {
            node: Rc::new(StreamNode {
                listeners: RefCell::new(Vec::new()),
                rank: std::cell::Cell::new(rank),
                keep_alive: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Position in the dependency order used to schedule cell updates
    pub(crate) fn rank(&self) -> u64 {
        self.node.rank.get()
    }

    /// A stream that never fires
    pub fn never() -> Self {
        Self::new()
    }

    pub(crate) fn fire(&self, value: &T) {
        self.node.fire(value);
    }

    pub(crate) fn downgrade(&self) -> WeakStream<T> {
        WeakStream(Rc::downgrade(&self.node))
    }

    pub(crate) fn keep_alive(&self, registration: Box<dyn Any>) {
        self.node.keep_alive.borrow_mut().push(registration);
    }

    /// Registers `handler` on this stream on behalf of `out`.
    ///
    /// `out` owns the registration, so the handler lives exactly as long as
    /// the derived stream does.
    pub(crate) fn attach<U: 'static>(
        &self,
        out: &Stream<U>,
        handler: impl Fn(&Stream<U>, &T) + 'static,
    ) {
        let target = out.downgrade();
        let listener: Rc<dyn Fn(&T)> = Rc::new(move |value: &T| {
            if let Some(out) = target.upgrade() {
                handler(&out, value);
            }
        });
        self.node.listeners.borrow_mut().push(Rc::downgrade(&listener));
        out.node.rank.set(out.rank().max(self.rank() + 1));
        out.keep_alive(Box::new(listener));
        out.keep_alive(Box::new(self.clone()));
    }

    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let out = Stream::new();
        self.attach(&out, move |out, value| out.fire(&f(value)));
        out
    }

    pub fn map_to<U: Clone + 'static>(&self, value: U) -> Stream<U> {
        self.map(move |_| value.clone())
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let out = Stream::new();
        self.attach(&out, move |out, value| {
            if predicate(value) {
                out.fire(value);
            }
        });
        out
    }

    /// Fires `f(event, cell value)` where the cell is sampled as it was
    /// before the current transaction.
    pub fn snapshot<B: 'static, C: 'static>(
        &self,
        cell: &Cell<B>,
        f: impl Fn(&T, &B) -> C + 'static,
    ) -> Stream<C> {
        let out = Stream::new();
        let cell = cell.clone();
        self.attach(&out, move |out, value| out.fire(&f(value, &cell.sample())));
        out
    }

    pub fn snapshot1<B: Clone + 'static>(&self, cell: &Cell<B>) -> Stream<B> {
        self.snapshot(cell, |_, sampled: &B| sampled.clone())
    }

    pub fn listen(&self, f: impl Fn(&T) + 'static) -> Listener {
        let listener: Rc<dyn Fn(&T)> = Rc::new(f);
        self.node.listeners.borrow_mut().push(Rc::downgrade(&listener));
        Listener::new(vec![Box::new(listener), Box::new(self.clone())])
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Merges two streams into one event per transaction.
    ///
    /// When both fire in the same transaction the event from `self` wins.
    pub fn or_else(&self, other: &Stream<T>) -> Stream<T> {
        let out = Stream::new();
        let slot: Rc<RefCell<Option<(bool, T)>>> = Rc::new(RefCell::new(None));

        for (is_left, source) in [(true, self), (false, other)] {
            let slot = slot.clone();
            source.attach(&out, move |out, value| {
                let mut pending = slot.borrow_mut();
                let first = pending.is_none();
                let left_already_fired = matches!(pending.as_ref(), Some((true, _)));
                if is_left || !left_already_fired {
                    *pending = Some((is_left, value.clone()));
                }
                drop(pending);

                if first {
                    let slot = slot.clone();
                    let target = out.downgrade();
                    Transaction::prioritized(move || {
                        let merged = slot.borrow_mut().take();
                        if let (Some((_, value)), Some(out)) = (merged, target.upgrade()) {
                            out.fire(&value);
                        }
                    });
                }
            });
        }
        out
    }

    /// Holds the most recent event, starting from `initial`.
    pub fn hold(&self, initial: T) -> Cell<T> {
        Cell::hold(initial, self)
    }

    /// Folds events into state: `state' = f(event, state)`.
    pub fn accum<S: Clone + 'static>(
        &self,
        initial: S,
        f: impl Fn(&T, &S) -> S + 'static,
    ) -> Cell<S> {
        Transaction::run(|| {
            let state = CellLoop::new();
            let accumulated = self.snapshot(&state.cell(), f).hold(initial);
            state.bind(&accumulated);
            accumulated
        })
    }
}

pub(crate) struct WeakStream<T>(Weak<StreamNode<T>>);

impl<T> WeakStream<T> {
    pub(crate) fn upgrade(&self) -> Option<Stream<T>> {
        self.0.upgrade().map(|node| Stream { node })
    }
}

/// The input end of a stream, fed from outside the reactive graph.
pub struct StreamSink<T> {
    stream: Stream<T>,
}

impl<T: 'static> StreamSink<T> {
    pub fn new() -> Self {
        StreamSink {
            stream: Stream::new(),
        }
    }

    /// Fires `value`, opening a transaction if none is active.
    pub fn send(&self, value: T) {
        Transaction::run(|| self.stream.fire(&value));
    }

    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }
}

impl<T: 'static> Default for StreamSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for StreamSink<T> {
    fn clone(&self) -> Self {
        StreamSink {
            stream: self.stream.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Rc<RefCell<Vec<T>>>, Listener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener = stream.listen(move |value: &T| sink.borrow_mut().push(value.clone()));
        (seen, listener)
    }

    #[test]
    fn map_and_filter_transform_events() {
        let sink = StreamSink::new();
        let evens = sink.stream().filter(|n: &i32| n % 2 == 0).map(|n| n * 10);
        let (seen, _listener) = collect(&evens);

        for n in 1..=5 {
            sink.send(n);
        }
        assert_eq!(*seen.borrow(), vec![20, 40]);
    }

    #[test]
    fn intermediate_streams_stay_alive_through_derived_ones() {
        let sink = StreamSink::new();
        let derived = sink.stream().map(|n: &i32| n + 1).map_to("tick");
        let (seen, _listener) = collect(&derived);

        sink.send(1);
        assert_eq!(*seen.borrow(), vec!["tick"]);
    }

    #[test]
    fn dropping_the_listener_unsubscribes() {
        let sink = StreamSink::new();
        let (seen, listener) = collect(&sink.stream());
        sink.send(1);
        drop(listener);
        sink.send(2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn or_else_prefers_the_left_stream_when_simultaneous() {
        let left = StreamSink::new();
        let right = StreamSink::new();
        let merged = left.stream().or_else(&right.stream());
        let (seen, _listener) = collect(&merged);

        Transaction::run(|| {
            right.send("right");
            left.send("left");
        });
        right.send("alone");
        assert_eq!(*seen.borrow(), vec!["left", "alone"]);
    }

    #[test]
    fn snapshot_samples_the_value_before_the_transaction() {
        let sink = StreamSink::new();
        let held = sink.stream().hold(0);
        let observed = sink.stream().snapshot(&held, |event: &i32, before: &i32| (*event, *before));
        let (seen, _listener) = collect(&observed);

        sink.send(1);
        sink.send(2);
        assert_eq!(*seen.borrow(), vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn accum_folds_events() {
        let sink = StreamSink::new();
        let total = sink.stream().accum(10, |n: &i32, acc: &i32| acc + n);
        sink.send(1);
        sink.send(2);
        assert_eq!(total.sample(), 13);
    }
}
