//! Timers live outside the machine: an async task feeds tick events into a
//! shared machine.

use hfsm::{event_enum, Machine, Row, StateDescriptor, StateGraph, TransitionTable};
use std::sync::{Arc, Mutex};
use std::time::Duration;

event_enum! {
    enum Clock: ClockKind {
        Tick,
        Expire,
    }
}

#[derive(Debug, Default)]
struct Countdown {
    ticks: u32,
}

type State = StateDescriptor<Clock, Countdown>;
type R = Row<Clock, Countdown>;

fn countdown(limit: u32) -> Machine<Clock, Countdown> {
    let mut graph = StateGraph::new();
    let armed = graph.add_state(State::new("armed").on_event(ClockKind::Tick, move |scope| {
        scope.context_mut().ticks += 1;
        if scope.context().ticks >= limit {
            scope.process_event(Clock::Expire);
        }
        Ok(())
    }));
    let expired = graph.add_state(State::new("expired"));
    graph.add_root_region(
        TransitionTable::new("timer")
            .row(R::initial(armed))
            .row(R::new(armed, expired).on(ClockKind::Expire)),
    );
    Machine::new(graph, Countdown::default()).unwrap()
}

#[tokio::test]
async fn external_ticks_drive_the_machine() {
    let machine = Arc::new(Mutex::new(countdown(3)));

    let ticker = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(5));
            for _ in 0..5 {
                interval.tick().await;
                let mut machine = machine.lock().unwrap();
                machine.process_event(Clock::Tick).unwrap();
            }
        })
    };
    ticker.await.unwrap();

    let machine = machine.lock().unwrap();
    assert!(machine.is_named("expired"));
    // Ticks after expiry are not handled by the expired state.
    assert_eq!(machine.context().ticks, 3);
}

#[tokio::test]
async fn concurrent_senders_are_serialised_by_the_lock() {
    let machine = Arc::new(Mutex::new(countdown(u32::MAX)));

    let senders: Vec<_> = (0..4)
        .map(|_| {
            let machine = Arc::clone(&machine);
            tokio::spawn(async move {
                for _ in 0..25 {
                    machine.lock().unwrap().process_event(Clock::Tick).unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for sender in senders {
        sender.await.unwrap();
    }

    let machine = machine.lock().unwrap();
    assert_eq!(machine.context().ticks, 100);
    assert!(machine.is_named("armed"));
}
