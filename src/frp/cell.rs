use std::cell::RefCell;
use std::rc::Rc;

use super::stream::{Stream, StreamSink};
use super::{FrpError, Listener, Transaction};

/// Which value a sample observes while a transaction is open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    /// The value committed before the transaction
    Committed,
    /// The value the transaction is about to commit
    Pending,
}

type Sampler<T> = Rc<dyn Fn(Phase) -> T>;

struct HoldState<T> {
    value: RefCell<T>,
    pending: RefCell<Option<T>>,
}

/// A value that changes over time.
pub struct Cell<T> {
    sampler: Sampler<T>,
    updates: Stream<T>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Cell {
            sampler: self.sampler.clone(),
            updates: self.updates.clone(),
        }
    }
}

impl<T: 'static> Cell<T> {
    /// Current value. Inside a transaction this is the value from before it.
    pub fn sample(&self) -> T {
        (self.sampler)(Phase::Committed)
    }

    /// Fires with the new value each time the cell changes.
    pub fn updates(&self) -> Stream<T> {
        self.updates.clone()
    }

    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Cell<U> {
        let f = Rc::new(f);
        let source = self.sampler.clone();
        let sample_f = f.clone();
        Cell {
            sampler: Rc::new(move |phase: Phase| sample_f(&source(phase))),
            updates: self.updates.map(move |value| f(value)),
        }
    }

    pub fn lift<B: 'static, C: 'static>(
        &self,
        other: &Cell<B>,
        f: impl Fn(&T, &B) -> C + 'static,
    ) -> Cell<C> {
        let a = self.sampler.clone();
        let b = other.sampler.clone();
        let sampler: Sampler<C> = Rc::new(move |phase: Phase| f(&a(phase), &b(phase)));
        let changed = self.updates.map_to(()).or_else(&other.updates.map_to(()));
        Cell::derived(sampler, &changed)
    }

    pub fn lift3<B: 'static, C: 'static, D: 'static>(
        &self,
        second: &Cell<B>,
        third: &Cell<C>,
        f: impl Fn(&T, &B, &C) -> D + 'static,
    ) -> Cell<D> {
        let a = self.sampler.clone();
        let b = second.sampler.clone();
        let c = third.sampler.clone();
        let sampler: Sampler<D> =
            Rc::new(move |phase: Phase| f(&a(phase), &b(phase), &c(phase)));
        let changed = self
            .updates
            .map_to(())
            .or_else(&second.updates.map_to(()))
            .or_else(&third.updates.map_to(()));
        Cell::derived(sampler, &changed)
    }

    /// A cell computed by `sampler` that reports a new value once per
    /// transaction in which `changed` fires, after every input that ranks
    /// below it has settled.
    fn derived(sampler: Sampler<T>, changed: &Stream<()>) -> Cell<T> {
        let updates: Stream<T> = Stream::new();
        let scheduled = Rc::new(std::cell::Cell::new(false));
        let recompute = sampler.clone();
        changed.attach(&updates, move |out, _| {
            if scheduled.replace(true) {
                return;
            }
            let scheduled = scheduled.clone();
            let recompute = recompute.clone();
            let target = out.downgrade();
            Transaction::ranked(out.rank(), move || {
                scheduled.set(false);
                if let Some(out) = target.upgrade() {
                    out.fire(&recompute(Phase::Pending));
                }
            });
        });
        Cell { sampler, updates }
    }

    /// Fires the current value in this transaction, then every update.
    pub fn value(&self) -> Stream<T> {
        Transaction::run(|| {
            let out: Stream<T> = Stream::new();
            self.updates.attach(&out, |out, value| out.fire(value));

            let target = out.downgrade();
            let sampler = self.sampler.clone();
            Transaction::prioritized(move || {
                if let Some(out) = target.upgrade() {
                    out.fire(&sampler(Phase::Committed));
                }
            });
            out
        })
    }
}

impl<T: Clone + 'static> Cell<T> {
    /// Calls `f` with the current value now and with the new value once per
    /// transaction in which the cell changes, after that transaction closes.
    pub fn listen(&self, f: impl Fn(&T) + 'static) -> Listener {
        let f = Rc::new(f);
        f(&self.sample());

        let latest: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        let on_update = self.updates.listen(move |value: &T| {
            let first = latest.replace(Some(value.clone())).is_none();
            if first {
                let latest = latest.clone();
                let f = f.clone();
                Transaction::post(move || {
                    let next = latest.borrow_mut().take();
                    if let Some(value) = next {
                        f(&value);
                    }
                });
            }
        });
        on_update.append(Listener::new(vec![Box::new(self.clone())]))
    }

    pub fn constant(value: T) -> Cell<T> {
        Cell {
            sampler: Rc::new(move |_: Phase| value.clone()),
            updates: Stream::never(),
        }
    }

    pub(crate) fn hold(initial: T, source: &Stream<T>) -> Cell<T> {
        let state = Rc::new(HoldState {
            value: RefCell::new(initial),
            pending: RefCell::new(None),
        });

        let updates: Stream<T> = Stream::new();
        let writer = state.clone();
        source.attach(&updates, move |out, value| {
            let first = writer.pending.replace(Some(value.clone())).is_none();
            if first {
                let commit = writer.clone();
                Transaction::last(move || {
                    let next = commit.pending.borrow_mut().take();
                    if let Some(next) = next {
                        *commit.value.borrow_mut() = next;
                    }
                });

                // Fires once, with whatever the transaction settled on
                let latest = writer.clone();
                let target = out.downgrade();
                Transaction::ranked(out.rank(), move || {
                    let value = latest.pending.borrow().clone();
                    if let (Some(value), Some(out)) = (value, target.upgrade()) {
                        out.fire(&value);
                    }
                });
            }
        });

        let sampler: Sampler<T> = Rc::new(move |phase: Phase| match phase {
            Phase::Committed => state.value.borrow().clone(),
            Phase::Pending => state
                .pending
                .borrow()
                .clone()
                .unwrap_or_else(|| state.value.borrow().clone()),
        });
        Cell { sampler, updates }
    }
}

/// Streams that pass through a loop are ranked after everything built
/// outside one
const LOOP_RANK: u64 = 1 << 32;

/// A forward reference to a cell defined later in the same transaction.
pub struct CellLoop<T> {
    target: Rc<RefCell<Option<Cell<T>>>>,
    updates: Stream<T>,
}

impl<T: 'static> CellLoop<T> {
    pub fn new() -> Self {
        CellLoop {
            target: Rc::new(RefCell::new(None)),
            updates: Stream::with_rank(LOOP_RANK),
        }
    }

    /// The cell that will follow whatever this loop is bound to.
    ///
    /// # Panics
    ///
    /// Sampling it before [`CellLoop::loop_cell`] has been called panics.
    pub fn cell(&self) -> Cell<T> {
        let target = self.target.clone();
        Cell {
            sampler: Rc::new(move |phase: Phase| match &*target.borrow() {
                Some(cell) => (cell.sampler)(phase),
                None => panic!("cell loop sampled before it was bound"),
            }),
            updates: self.updates.clone(),
        }
    }

    /// Binds the loop to `cell`. A loop can only be bound once.
    pub fn loop_cell(&self, cell: &Cell<T>) -> Result<(), FrpError> {
        if self.target.borrow().is_some() {
            return Err(FrpError::LoopAlreadyBound);
        }
        self.bind(cell);
        Ok(())
    }

    pub(crate) fn bind(&self, cell: &Cell<T>) {
        *self.target.borrow_mut() = Some(cell.clone());
        cell.updates.attach(&self.updates, |out, value| out.fire(value));
    }
}

impl<T: 'static> Default for CellLoop<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A cell written from outside the reactive graph.
pub struct CellSink<T> {
    sink: StreamSink<T>,
    cell: Cell<T>,
}

impl<T: Clone + 'static> CellSink<T> {
    pub fn new(initial: T) -> Self {
        let sink = StreamSink::new();
        let cell = sink.stream().hold(initial);
        CellSink { sink, cell }
    }

    /// Sets the value. It becomes visible once the transaction closes.
    pub fn send(&self, value: T) {
        self.sink.send(value);
    }

    pub fn cell(&self) -> Cell<T> {
        self.cell.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<T: Clone + 'static>(cell: &Cell<T>) -> (Rc<RefCell<Vec<T>>>, Listener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener = cell.listen(move |value: &T| sink.borrow_mut().push(value.clone()));
        (seen, listener)
    }

    #[test]
    fn cell_sink_commits_at_transaction_end() {
        let sink = CellSink::new(1);
        let cell = sink.cell();
        Transaction::run(|| {
            sink.send(2);
            assert_eq!(cell.sample(), 1);
        });
        assert_eq!(cell.sample(), 2);
    }

    #[test]
    fn constant_never_changes() {
        let cell = Cell::constant("earth");
        let (seen, _listener) = record(&cell);
        assert_eq!(cell.sample(), "earth");
        assert_eq!(*seen.borrow(), vec!["earth"]);
    }

    #[test]
    fn map_follows_its_source() {
        let sink = CellSink::new(2);
        let doubled = sink.cell().map(|n: &i32| n * 2);
        let (seen, _listener) = record(&doubled);

        sink.send(5);
        assert_eq!(doubled.sample(), 10);
        assert_eq!(*seen.borrow(), vec![4, 10]);
    }

    #[test]
    fn lift_fires_once_when_both_inputs_change_together() {
        let a = CellSink::new(1);
        let b = CellSink::new(10);
        let sum = a.cell().lift(&b.cell(), |x: &i32, y: &i32| x + y);
        let (seen, _listener) = record(&sum);

        Transaction::run(|| {
            a.send(2);
            b.send(20);
        });
        b.send(30);
        assert_eq!(*seen.borrow(), vec![11, 22, 32]);
    }

    #[test]
    fn lift_updates_fire_once_with_the_settled_value() {
        let a = CellSink::new(0);
        let left = StreamSink::new();
        let right = StreamSink::new();
        let b = left.stream().or_else(&right.stream()).hold(0);
        let sum = a.cell().lift(&b, |x: &i32, y: &i32| x + y);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _listener = sum
            .updates()
            .listen(move |value: &i32| s.borrow_mut().push(*value));

        Transaction::run(|| {
            a.send(1);
            left.send(10);
        });
        assert_eq!(*seen.borrow(), vec![11]);
    }

    #[test]
    fn hold_reports_one_update_per_transaction() {
        let sink = CellSink::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _listener = sink
            .cell()
            .updates()
            .listen(move |value: &i32| s.borrow_mut().push(*value));

        Transaction::run(|| {
            sink.send(1);
            sink.send(2);
        });
        sink.send(3);
        assert_eq!(*seen.borrow(), vec![2, 3]);
    }

    #[test]
    fn listener_may_send_back_into_its_own_cell() {
        let feedback = StreamSink::new();
        let cell = feedback.stream().hold(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let sender = feedback.clone();
        let _listener = cell.listen(move |value: &i32| {
            s.borrow_mut().push(*value);
            if *value == 1 {
                sender.send(2);
            }
        });

        feedback.send(1);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(cell.sample(), 2);
    }

    #[test]
    fn lift3_combines_three_cells() {
        let a = CellSink::new(1.0);
        let b = CellSink::new(2.0);
        let c = CellSink::new(3.0);
        let product = a
            .cell()
            .lift3(&b.cell(), &c.cell(), |x: &f64, y: &f64, z: &f64| x * y * z);
        assert_eq!(product.sample(), 6.0);
        c.send(4.0);
        assert_eq!(product.sample(), 8.0);
    }

    #[test]
    fn listeners_run_after_the_transaction_with_the_last_value() {
        let sink = CellSink::new(0);
        let cell = sink.cell();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let o = observed.clone();
        let current = cell.clone();
        let _listener = cell.listen(move |value: &i32| {
            o.borrow_mut().push((*value, current.sample()));
        });

        Transaction::run(|| {
            sink.send(1);
            sink.send(2);
        });
        assert_eq!(*observed.borrow(), vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn value_fires_the_current_value_then_updates() {
        let sink = CellSink::new(7);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _listener = Transaction::run(|| {
            sink.cell()
                .value()
                .listen(move |value: &i32| s.borrow_mut().push(*value))
        });
        sink.send(8);
        assert_eq!(*seen.borrow(), vec![7, 8]);
    }

    #[test]
    fn loop_cannot_be_bound_twice() {
        let cell_loop = CellLoop::new();
        let first = Cell::constant(1);
        assert_eq!(cell_loop.loop_cell(&first), Ok(()));
        assert_eq!(
            cell_loop.loop_cell(&Cell::constant(2)),
            Err(FrpError::LoopAlreadyBound)
        );
        assert_eq!(cell_loop.cell().sample(), 1);
    }

    #[test]
    #[should_panic(expected = "before it was bound")]
    fn sampling_an_unbound_loop_panics() {
        let cell_loop: CellLoop<i32> = CellLoop::new();
        cell_loop.cell().sample();
    }

    #[test]
    fn loop_through_hold_feeds_back_previous_state() {
        let ticks = StreamSink::new();
        let counter = Transaction::run(|| {
            let state = CellLoop::new();
            let next = ticks.stream().snapshot(&state.cell(), |_: &(), n: &u32| n + 1);
            let counter = next.hold(0);
            state.loop_cell(&counter).map(|_| counter)
        })
        .unwrap();

        for _ in 0..3 {
            ticks.send(());
        }
        assert_eq!(counter.sample(), 3);
    }
}
