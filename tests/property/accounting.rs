//! Property tests for URL call accounting.
//!
//! Invariants tested:
//! - success + error + abandoned == requested, whatever the outcomes
//! - Admission failures within the retry limit abandon nothing
//! - Exhausted admission abandons exactly the unscheduled calls

use proptest::prelude::*;
use std::sync::Mutex;
use std::time::Duration;
use stress_injector_core::CancellationToken;
use stress_injector_url::{
    Admission, AdmissionError, AdmissionPermit, CallKind, LoadInjector, PoolAdmission,
    RequestError, Termination,
};
use tokio::runtime::Builder;

/// Refuses admissions according to a script, then admits everything.
struct Scripted {
    refusals: Mutex<Vec<bool>>,
}

impl Scripted {
    fn new(mut script: Vec<bool>) -> Self {
        script.reverse();
        Self {
            refusals: Mutex::new(script),
        }
    }
}

impl Admission for Scripted {
    fn try_admit(&self) -> Result<AdmissionPermit, AdmissionError> {
        match self.refusals.lock().unwrap().pop() {
            Some(true) => Err(AdmissionError { capacity: 0 }),
            _ => Ok(AdmissionPermit::unbounded()),
        }
    }

    fn capacity(&self) -> usize {
        usize::MAX
    }
}

fn paused_runtime() -> tokio::runtime::Runtime {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: every requested call lands in exactly one bucket
    #[test]
    fn outcomes_always_add_up(
        outcomes in prop::collection::vec(any::<bool>(), 1..200),
        pool in 1usize..32,
    ) {
        let rt = paused_runtime();
        let rate = outcomes.len();
        let result = rt.block_on(async {
            let script = outcomes.clone();
            let service = tower::service_fn(move |call: CallKind| {
                let ok = match call {
                    CallKind::Bulk { index } => script[index],
                    CallKind::Preflight => true,
                };
                async move {
                    if ok { Ok::<u16, RequestError>(200) } else { Err(RequestError::Status(500)) }
                }
            });
            LoadInjector::new(service, PoolAdmission::new(pool), 1_000, Duration::from_millis(1))
                .run(rate, &CancellationToken::new())
                .await
                .result
        });

        let expected_success = outcomes.iter().filter(|ok| **ok).count();
        prop_assert_eq!(result.success, expected_success);
        prop_assert_eq!(result.error, rate - expected_success);
        prop_assert_eq!(result.abandoned, 0);
        prop_assert!(result.verify().is_ok());
    }

    /// Property: refusals within the retry limit never abandon a call
    #[test]
    fn refusals_below_limit_schedule_everything(
        refusals in 0usize..6,
        extra in 0usize..4,
        rate in 1usize..50,
    ) {
        let limit = refusals + extra;
        let rt = paused_runtime();
        let injection = rt.block_on(async {
            let service = tower::service_fn(|_call: CallKind| async { Ok::<u16, RequestError>(200) });
            let admission = Scripted::new(vec![true; refusals]);
            LoadInjector::new(service, admission, limit, Duration::from_millis(5))
                .run(rate, &CancellationToken::new())
                .await
        });

        prop_assert_eq!(injection.termination, Termination::Completed);
        prop_assert_eq!(injection.result.scheduled, rate);
        prop_assert_eq!(injection.result.success, rate);
        prop_assert_eq!(injection.admission_retries, refusals);
    }

    /// Property: exhaustion abandons exactly the calls never scheduled
    #[test]
    fn exhaustion_abandons_the_remainder(
        admitted in 0usize..20,
        limit in 0usize..4,
        rate in 20usize..60,
    ) {
        let rt = paused_runtime();
        let injection = rt.block_on(async {
            let service = tower::service_fn(|_call: CallKind| async { Ok::<u16, RequestError>(200) });
            let mut script = vec![false; admitted];
            script.extend(std::iter::repeat_n(true, limit + 1));
            let admission = Scripted::new(script);
            LoadInjector::new(service, admission, limit, Duration::from_millis(5))
                .run(rate, &CancellationToken::new())
                .await
        });

        prop_assert_eq!(
            injection.termination,
            Termination::AdmissionExhausted { retries: limit + 1 }
        );
        prop_assert_eq!(injection.result.scheduled, admitted);
        prop_assert_eq!(injection.result.abandoned, rate - admitted);
        prop_assert!(injection.result.verify().is_ok());
    }
}
