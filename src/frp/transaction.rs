use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

type Action = Box<dyn FnOnce()>;

/// Work queued while a transaction is open, in the order it is drained
#[derive(Default)]
struct Queues {
    /// Deferred stream work (merges). May enqueue more.
    prioritized: VecDeque<Action>,
    /// Cell updates, lowest rank first, run once `prioritized` is empty
    ranked: BTreeMap<(u64, u64), Action>,
    next_seq: u64,
    /// Commits of held values
    last: Vec<Action>,
    /// Cell listeners, run after the transaction is gone
    post: Vec<Action>,
}

thread_local! {
    static CURRENT: RefCell<Option<Queues>> = const { RefCell::new(None) };
}

/// Groups every reactive update caused by one external event.
pub struct Transaction;

impl Transaction {
    /// Runs `f` inside a transaction, opening one if none is active.
    ///
    /// Nested calls join the outer transaction, which is closed only when the
    /// outermost call returns.
    pub fn run<R>(f: impl FnOnce() -> R) -> R {
        let opened = CURRENT.with(|current| {
            let mut current = current.borrow_mut();
            if current.is_none() {
                *current = Some(Queues::default());
                true
            } else {
                false
            }
        });

        let result = f();
        if opened {
            Self::close();
        }
        result
    }

    /// Whether a transaction is open on this thread
    pub fn is_active() -> bool {
        CURRENT.with(|current| current.borrow().is_some())
    }

    pub(crate) fn prioritized(action: impl FnOnce() + 'static) {
        Self::enqueue(move |queues, action| queues.prioritized.push_back(action), Box::new(action));
    }

    /// Queues a cell update. Lower ranks run first; equal ranks run in the
    /// order they were queued.
    pub(crate) fn ranked(rank: u64, action: impl FnOnce() + 'static) {
        Self::enqueue(
            move |queues, action| {
                queues.ranked.insert((rank, queues.next_seq), action);
                queues.next_seq += 1;
            },
            Box::new(action),
        );
    }

    pub(crate) fn last(action: impl FnOnce() + 'static) {
        Self::enqueue(move |queues, action| queues.last.push(action), Box::new(action));
    }

    pub(crate) fn post(action: impl FnOnce() + 'static) {
        Self::enqueue(move |queues, action| queues.post.push(action), Box::new(action));
    }

    fn enqueue(push: impl FnOnce(&mut Queues, Action) + 'static, action: Action) {
        Self::run(move || {
            CURRENT.with(|current| {
                if let Some(queues) = current.borrow_mut().as_mut() {
                    push(queues, action);
                }
            })
        })
    }

    fn close() {
        // Borrows are released before each action runs, since actions enqueue
        while let Some(action) = CURRENT.with(|current| {
            current.borrow_mut().as_mut().and_then(|queues| {
                queues
                    .prioritized
                    .pop_front()
                    .or_else(|| queues.ranked.pop_first().map(|(_, action)| action))
            })
        }) {
            action();
        }

        let commits = CURRENT.with(|current| {
            current
                .borrow_mut()
                .as_mut()
                .map(|queues| std::mem::take(&mut queues.last))
                .unwrap_or_default()
        });
        for commit in commits {
            commit();
        }

        let finished = CURRENT.with(|current| current.borrow_mut().take());
        if let Some(queues) = finished {
            for action in queues.post {
                action();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn nested_runs_join_the_outer_transaction() {
        assert!(!Transaction::is_active());
        Transaction::run(|| {
            assert!(Transaction::is_active());
            Transaction::run(|| assert!(Transaction::is_active()));
            assert!(Transaction::is_active());
        });
        assert!(!Transaction::is_active());
    }

    #[test]
    fn phases_drain_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        Transaction::run(|| {
            let l = log.clone();
            Transaction::post(move || l.borrow_mut().push("post"));
            let l = log.clone();
            Transaction::last(move || l.borrow_mut().push("last"));
            let l = log.clone();
            Transaction::prioritized(move || {
                l.borrow_mut().push("prioritized");
                let l = l.clone();
                Transaction::prioritized(move || l.borrow_mut().push("chained"));
            });
        });
        assert_eq!(*log.borrow(), vec!["prioritized", "chained", "last", "post"]);
    }

    #[test]
    fn ranked_work_waits_for_merges_and_runs_lowest_rank_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        Transaction::run(|| {
            let l = log.clone();
            Transaction::last(move || l.borrow_mut().push("last"));
            let l = log.clone();
            Transaction::ranked(5, move || l.borrow_mut().push("rank 5"));
            let l = log.clone();
            Transaction::ranked(2, move || {
                l.borrow_mut().push("rank 2");
                let l = l.clone();
                Transaction::prioritized(move || l.borrow_mut().push("merge"));
            });
            let l = log.clone();
            Transaction::prioritized(move || l.borrow_mut().push("prioritized"));
        });
        assert_eq!(
            *log.borrow(),
            vec!["prioritized", "rank 2", "merge", "rank 5", "last"]
        );
    }

    #[test]
    fn post_actions_run_outside_the_transaction() {
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        Transaction::run(|| {
            Transaction::post(move || *s.borrow_mut() = Some(Transaction::is_active()));
        });
        assert_eq!(*seen.borrow(), Some(false));
    }

    #[test]
    fn enqueue_outside_a_transaction_runs_immediately() {
        let ran = Rc::new(RefCell::new(false));
        let r = ran.clone();
        Transaction::prioritized(move || *r.borrow_mut() = true);
        assert!(*ran.borrow());
    }
}
