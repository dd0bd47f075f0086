use chrono::{TimeZone, Utc};
use payment_poller::domain::countdown::{format_remaining, remaining};
use payment_poller::domain::id::OrderId;
use payment_poller::domain::payment::{PaymentStatus, StatusReport, confirmation_progress};
use payment_poller::domain::session::{PaymentSession, SessionEvent, Step};
use proptest::prelude::*;
use std::time::Duration;

fn arb_status() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Confirming),
        Just(PaymentStatus::Confirmed),
        Just(PaymentStatus::Expired),
        Just(PaymentStatus::Failed),
    ]
}

fn arb_terminal() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Confirmed),
        Just(PaymentStatus::Expired),
        Just(PaymentStatus::Failed),
    ]
}

proptest! {
    /// Progress stays within [0, 100] whatever the service reports.
    #[test]
    fn progress_is_bounded(seen in any::<Option<u32>>(), required in any::<Option<u32>>()) {
        let progress = confirmation_progress(seen, required);
        prop_assert!(progress.is_finite());
        prop_assert!((0.0..=100.0).contains(&progress));
    }

    /// Absent or zero denominators render as 0, never NaN.
    #[test]
    fn missing_denominator_is_zero(seen in any::<Option<u32>>()) {
        prop_assert_eq!(confirmation_progress(seen, Some(0)), 0.0);
        prop_assert_eq!(confirmation_progress(seen, None), 0.0);
    }

    /// Remaining time is never negative and is exact while the expiry is ahead.
    #[test]
    fn countdown_never_negative(offset in -10_000_000i64..10_000_000i64) {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let expiry = now + chrono::Duration::seconds(offset);
        let left = remaining(expiry, now);

        if offset > 0 {
            prop_assert_eq!(left, Duration::from_secs(offset as u64));
        } else {
            prop_assert_eq!(left, Duration::ZERO);
        }
        prop_assert!(!format_remaining(left).contains('-'));
    }

    /// Any status sequence ending in a terminal status yields exactly one outcome,
    /// and nothing after it is applied.
    #[test]
    fn exactly_one_outcome(
        prefix in prop::collection::vec(arb_status(), 0..20),
        terminal in arb_terminal(),
        suffix in prop::collection::vec(arb_status(), 0..10),
    ) {
        let mut session = PaymentSession::new(OrderId::new("ORD-1").unwrap(), None);
        session.apply(SessionEvent::DetailsLoaded(None));

        let mut finishes = 0;
        let mut after_finish = Vec::new();
        for status in prefix.iter().chain(std::iter::once(&terminal)).chain(suffix.iter()) {
            let step = session.apply(SessionEvent::StatusObserved(StatusReport::new(*status)));
            if finishes > 0 {
                after_finish.push(step.clone());
            }
            if matches!(step, Step::Finish(_)) {
                finishes += 1;
            }
        }

        prop_assert_eq!(finishes, 1);
        prop_assert!(after_finish.iter().all(|s| *s == Step::Ignored));
        prop_assert!(session.outcome().is_some());
    }

    /// as_str → try_from roundtrip is identity for any status.
    #[test]
    fn status_roundtrip(status in arb_status()) {
        let roundtripped = PaymentStatus::try_from(status.as_str()).unwrap();
        prop_assert_eq!(roundtripped, status);
    }
}

#[test]
fn format_remaining_pads_seconds() {
    assert_eq!(format_remaining(Duration::from_secs(0)), "0:00");
    assert_eq!(format_remaining(Duration::from_secs(65)), "1:05");
    assert_eq!(format_remaining(Duration::from_secs(1800)), "30:00");
}
