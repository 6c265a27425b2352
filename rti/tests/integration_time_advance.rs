/// Integration tests for time management: regulation, constrained mode,
/// advance grants and ordered delivery through the federation executive.
use pergola_rti::{
    Callback, Federation, FederationConfig, FederationError, LogicalTime, Lookahead,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn time(value: f64) -> LogicalTime {
    LogicalTime::new(value).unwrap()
}

fn lookahead(value: f64) -> Lookahead {
    Lookahead::new(value).unwrap()
}

fn grants_of(callbacks: &[Callback]) -> Vec<LogicalTime> {
    callbacks
        .iter()
        .filter_map(|callback| match callback {
            Callback::TimeAdvanceGrant { time } => Some(*time),
            _ => None,
        })
        .collect()
}

/// One regulating federate bounds the federation; its advance unblocks the
/// constrained federate waiting behind the boundary.
#[test]
fn blocked_advance_is_granted_when_the_regulator_moves() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();

    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();
    assert_eq!(federation.galt(), time(5.0));

    // 10 > 5: recorded pending, not granted
    federation.time_advance_request(b, time(10.0)).unwrap();
    let mut events = federation.take_events();
    assert!(grants_of(&events.take_for(b)).is_empty());

    // the regulator's advance raises the boundary to 105
    federation.time_advance_request(a, time(100.0)).unwrap();
    assert_eq!(federation.galt(), time(105.0));

    let mut events = federation.take_events();
    assert_eq!(grants_of(&events.take_for(a)), vec![time(100.0)]);
    assert_eq!(grants_of(&events.take_for(b)), vec![time(10.0)]);
    assert_eq!(federation.granted_time(b).unwrap(), time(10.0));
}

/// A timestamped message is not released to a constrained federate until
/// the sender can no longer produce anything earlier; the grant then lands
/// on the message's timestamp, after the delivery.
#[test]
fn next_event_waits_for_the_boundary_and_grants_at_the_message() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    federation
        .send_message(a, &[b], b"interaction".to_vec(), Some(time(50.0)))
        .unwrap();
    federation.next_event_request(b, time(100.0)).unwrap();

    // boundary is still 5: neither the message nor a grant may reach b
    let mut events = federation.take_events();
    let before = events.take_for(b);
    assert!(before
        .iter()
        .all(|callback| !matches!(callback, Callback::Delivery { .. })));
    assert!(grants_of(&before).is_empty());

    federation.time_advance_request(a, time(95.0)).unwrap();

    let mut events = federation.take_events();
    let after = events.take_for(b);
    assert_eq!(
        after,
        vec![
            Callback::Delivery {
                message: pergola_rti::RoutedMessage::new(a, b"interaction".to_vec()),
                timestamp: Some(time(50.0)),
            },
            Callback::TimeAdvanceGrant { time: time(50.0) },
        ]
    );
}

/// Every queued delivery at or below the granted time arrives before the
/// grant itself, in timestamp order.
#[test]
fn deliveries_precede_the_grant_in_timestamp_order() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(1.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    for ts in [30.0, 10.0, 20.0] {
        federation
            .send_message(a, &[b], vec![ts as u8], Some(time(ts)))
            .unwrap();
    }
    federation.time_advance_request(b, time(25.0)).unwrap();
    federation.time_advance_request(a, time(99.0)).unwrap();

    let mut events = federation.take_events();
    let callbacks = events.take_for(b);
    let timestamps: Vec<_> = callbacks
        .iter()
        .filter_map(|callback| match callback {
            Callback::Delivery { timestamp, .. } => *timestamp,
            _ => None,
        })
        .collect();
    assert_eq!(timestamps, vec![time(10.0), time(20.0)]);
    // ts=30 stays queued; the grant is the last callback
    assert_eq!(
        callbacks.last(),
        Some(&Callback::TimeAdvanceGrant { time: time(25.0) })
    );
}

/// A flush drains everything at or below the requested time without the
/// causality wait, and grants immediately.
#[test]
fn flush_queue_grants_without_waiting_for_the_boundary() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    federation
        .send_message(a, &[b], vec![1], Some(time(50.0)))
        .unwrap();
    federation
        .send_message(a, &[b], vec![2], Some(time(80.0)))
        .unwrap();

    // boundary is 5, but the flush does not care
    federation.flush_queue_request(b, time(60.0)).unwrap();

    let mut events = federation.take_events();
    let callbacks = events.take_for(b);
    let delivered: Vec<_> = callbacks
        .iter()
        .filter_map(|callback| match callback {
            Callback::Delivery { timestamp, .. } => *timestamp,
            _ => None,
        })
        .collect();
    assert_eq!(delivered, vec![time(50.0)]);
    assert_eq!(grants_of(&callbacks), vec![time(60.0)]);
}

/// Receive-ordered messages to an idle constrained federate wait in the
/// backlog until asynchronous delivery is switched on or a grant happens.
#[test]
fn receive_order_backlog_waits_for_async_delivery() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_constrained(b).unwrap();

    federation
        .send_message(a, &[b], b"ro".to_vec(), None)
        .unwrap();
    let mut events = federation.take_events();
    assert!(events.take_for(b).iter().all(|c| !matches!(c, Callback::Delivery { .. })));

    federation.enable_async_delivery(b).unwrap();
    let mut events = federation.take_events();
    assert_eq!(
        events.take_for(b),
        vec![Callback::Delivery {
            message: pergola_rti::RoutedMessage::new(a, b"ro".to_vec()),
            timestamp: None,
        }]
    );

    // unconstrained destinations get receive-order messages immediately
    federation
        .send_message(b, &[a], b"now".to_vec(), None)
        .unwrap();
    let mut events = federation.take_events();
    assert_eq!(events.take_for(a).len(), 1);
}

#[test]
fn receive_order_backlog_is_released_by_a_grant() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_constrained(b).unwrap();
    federation.take_events();

    federation
        .send_message(a, &[b], b"held".to_vec(), None)
        .unwrap();
    // no regulating federates: the advance is granted immediately and the
    // backlog rides out with it
    federation.time_advance_request(b, time(10.0)).unwrap();

    let mut events = federation.take_events();
    let callbacks = events.take_for(b);
    assert_eq!(
        callbacks,
        vec![
            Callback::Delivery {
                message: pergola_rti::RoutedMessage::new(a, b"held".to_vec()),
                timestamp: None,
            },
            Callback::TimeAdvanceGrant { time: time(10.0) },
        ]
    );
}

/// A constrained-mode switch for a federate already past the boundary is
/// deferred until the boundary catches up.
#[test]
fn constrained_enable_defers_until_the_boundary_catches_up() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let c = federation.join();

    // a runs ahead while nobody regulates
    federation.time_advance_request(a, time(100.0)).unwrap();
    federation.enable_regulation(c, lookahead(5.0)).unwrap();
    assert_eq!(federation.galt(), time(5.0));

    federation.enable_constrained(a).unwrap();
    let mut events = federation.take_events();
    assert!(!events
        .take_for(a)
        .iter()
        .any(|c| matches!(c, Callback::ConstrainedEnabled { .. })));

    // advancing while the switch is pending is a state conflict
    assert_eq!(
        federation.time_advance_request(a, time(200.0)),
        Err(FederationError::ConstrainedPending { federate: a })
    );

    federation.time_advance_request(c, time(100.0)).unwrap();
    let mut events = federation.take_events();
    assert!(events
        .take_for(a)
        .contains(&Callback::ConstrainedEnabled { time: time(100.0) }));
}

/// Resignation of the only regulating federate unbounds the federation and
/// releases everything waiting on it.
#[test]
fn resigning_regulator_unblocks_pending_advances() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    federation.time_advance_request(b, time(50.0)).unwrap();
    let mut events = federation.take_events();
    assert!(grants_of(&events.take_for(b)).is_empty());

    federation.resign(a).unwrap();
    assert!(federation.galt().is_unbounded());

    let mut events = federation.take_events();
    assert_eq!(grants_of(&events.take_for(b)), vec![time(50.0)]);
}

#[test]
fn disable_when_not_enabled_is_a_rejected_no_op() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let galt_before = federation.galt();

    assert_eq!(
        federation.disable_regulation(a),
        Err(FederationError::RegulationNotEnabled { federate: a })
    );
    assert_eq!(
        federation.disable_constrained(a),
        Err(FederationError::ConstrainedNotEnabled { federate: a })
    );
    assert_eq!(federation.galt(), galt_before);
    assert_eq!(federation.granted_time(a).unwrap(), LogicalTime::ZERO);
}

#[test]
fn disabling_constrained_grants_the_blocked_advance() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    federation.time_advance_request(b, time(10.0)).unwrap();
    federation.disable_constrained(b).unwrap();

    let mut events = federation.take_events();
    assert_eq!(grants_of(&events.take_for(b)), vec![time(10.0)]);
}

/// Raising a regulator's lookahead moves the boundary and is re-evaluated
/// against every pending advance immediately.
#[test]
fn raising_lookahead_unblocks_a_pending_advance() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    federation.time_advance_request(b, time(10.0)).unwrap();
    let mut events = federation.take_events();
    assert!(grants_of(&events.take_for(b)).is_empty());

    assert_eq!(
        federation.modify_lookahead(b, lookahead(20.0)),
        Err(FederationError::RegulationNotEnabled { federate: b })
    );
    federation.modify_lookahead(a, lookahead(20.0)).unwrap();
    assert_eq!(federation.galt(), time(20.0));

    let mut events = federation.take_events();
    assert_eq!(grants_of(&events.take_for(b)), vec![time(10.0)]);
}

/// Switching regulation off removes the federate from the boundary and
/// releases everything waiting on it, like a resignation would.
#[test]
fn disabling_regulation_unblocks_pending_advances() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    federation.time_advance_request(b, time(50.0)).unwrap();
    let mut events = federation.take_events();
    assert!(grants_of(&events.take_for(b)).is_empty());

    federation.disable_regulation(a).unwrap();
    assert!(federation.galt().is_unbounded());

    let mut events = federation.take_events();
    assert_eq!(grants_of(&events.take_for(b)), vec![time(50.0)]);
}

/// Switching asynchronous delivery back off makes the backlog hold
/// receive-ordered messages again.
#[test]
fn disabling_async_delivery_resumes_backlog_holding() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_constrained(b).unwrap();
    federation.enable_async_delivery(b).unwrap();
    federation.take_events();

    assert_eq!(
        federation.disable_async_delivery(a),
        Err(FederationError::AsyncDeliveryNotEnabled { federate: a })
    );
    federation.disable_async_delivery(b).unwrap();

    federation
        .send_message(a, &[b], b"held again".to_vec(), None)
        .unwrap();
    let mut events = federation.take_events();
    assert!(events
        .take_for(b)
        .iter()
        .all(|c| !matches!(c, Callback::Delivery { .. })));

    // the next grant carries the backlog out
    federation.time_advance_request(b, time(1.0)).unwrap();
    let mut events = federation.take_events();
    assert_eq!(
        events.take_for(b),
        vec![
            Callback::Delivery {
                message: pergola_rti::RoutedMessage::new(a, b"held again".to_vec()),
                timestamp: None,
            },
            Callback::TimeAdvanceGrant { time: time(1.0) },
        ]
    );
}

#[test]
fn advance_request_preconditions() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    federation.time_advance_request(b, time(10.0)).unwrap();
    assert_eq!(
        federation.time_advance_request(b, time(20.0)),
        Err(FederationError::AdvanceInProgress { federate: b })
    );

    federation.time_advance_request(a, time(100.0)).unwrap();
    federation.take_events();
    assert_eq!(
        federation.time_advance_request(b, time(5.0)),
        Err(FederationError::TimeAlreadyPassed {
            requested: time(5.0),
            granted: time(10.0),
        })
    );
}

#[test]
fn mode_changes_are_rejected_while_an_advance_is_outstanding() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();
    federation.time_advance_request(b, time(10.0)).unwrap();

    assert_eq!(
        federation.enable_regulation(b, lookahead(1.0)),
        Err(FederationError::AdvanceInProgress { federate: b })
    );
    assert_eq!(
        federation.enable_constrained(a),
        Ok(()),
        "a has no advance outstanding"
    );
}

#[test]
fn zero_lookahead_is_a_federation_policy() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    assert_eq!(
        federation.enable_regulation(a, Lookahead::ZERO),
        Err(FederationError::InvalidLookahead { value: 0.0 })
    );

    let mut permissive = Federation::new(FederationConfig {
        allow_zero_lookahead: true,
        ..FederationConfig::default()
    });
    let b = permissive.join();
    assert!(permissive.enable_regulation(b, Lookahead::ZERO).is_ok());
}

#[test]
fn timestamped_sends_require_regulation_and_respect_the_floor() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();

    assert_eq!(
        federation.send_message(a, &[b], vec![], Some(time(10.0))),
        Err(FederationError::SenderNotRegulating { federate: a })
    );

    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    assert_eq!(
        federation.send_message(a, &[b], vec![], Some(time(2.0))),
        Err(FederationError::InvalidTime { value: 2.0 })
    );
    assert!(federation
        .send_message(a, &[b], vec![], Some(time(5.0)))
        .is_ok());
}

/// A timestamped message to an unconstrained destination loses its
/// timestamp and arrives immediately.
#[test]
fn unconstrained_destinations_receive_stripped_timestamps() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();

    federation
        .send_message(a, &[b], b"x".to_vec(), Some(time(40.0)))
        .unwrap();
    let mut events = federation.take_events();
    assert_eq!(
        events.take_for(b),
        vec![Callback::Delivery {
            message: pergola_rti::RoutedMessage::new(a, b"x".to_vec()),
            timestamp: None,
        }]
    );
}

#[test]
fn checkpoints_suspend_advancement() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();
    federation.time_advance_request(b, time(10.0)).unwrap();
    federation.take_events();

    federation.begin_checkpoint().unwrap();
    assert_eq!(
        federation.begin_checkpoint(),
        Err(FederationError::CheckpointInProgress)
    );
    assert_eq!(
        federation.time_advance_request(a, time(100.0)),
        Err(FederationError::CheckpointInProgress)
    );

    federation.end_checkpoint().unwrap();
    assert_eq!(
        federation.end_checkpoint(),
        Err(FederationError::CheckpointNotInProgress)
    );

    // progress resumes after the checkpoint
    federation.time_advance_request(a, time(100.0)).unwrap();
    let mut events = federation.take_events();
    assert_eq!(grants_of(&events.take_for(b)), vec![time(10.0)]);
}

#[test]
fn lits_is_the_minimum_of_boundary_and_queue() {
    init_logs();
    let mut federation = Federation::default();
    let a = federation.join();
    let b = federation.join();
    federation.enable_regulation(a, lookahead(5.0)).unwrap();
    federation.enable_constrained(b).unwrap();

    assert_eq!(federation.lits(b).unwrap(), time(5.0));
    federation
        .send_message(a, &[b], vec![], Some(time(7.0)))
        .unwrap();
    assert_eq!(federation.lits(b).unwrap(), time(5.0));

    federation.time_advance_request(a, time(95.0)).unwrap();
    assert_eq!(federation.lits(b).unwrap(), time(7.0));
}
