/// Verdict on one attempt's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Accepted(T),
    /// Usable as a signal to try again; the value is discarded.
    Weak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Accepted { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Runs `attempt` (1-based) until it accepts or `max_attempts` is spent.
///
/// Retries are immediate. An `Err` aborts the loop and is returned as-is.
/// `max_attempts` below one is treated as one.
pub fn retry_bounded<T, E, F>(max_attempts: u32, mut attempt: F) -> Result<RetryOutcome<T>, E>
where
    F: FnMut(u32) -> Result<Attempt<T>, E>,
{
    let max_attempts = max_attempts.max(1);
    for number in 1..=max_attempts {
        if let Attempt::Accepted(value) = attempt(number)? {
            return Ok(RetryOutcome::Accepted {
                value,
                attempts: number,
            });
        }
    }
    Ok(RetryOutcome::Exhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::{retry_bounded, Attempt, RetryOutcome};

    #[test]
    fn stops_at_first_accepted_attempt() {
        let mut calls = 0;
        let outcome: Result<_, ()> = retry_bounded(3, |number| {
            calls += 1;
            Ok(if number == 2 {
                Attempt::Accepted("ok")
            } else {
                Attempt::Weak
            })
        });
        assert_eq!(
            outcome,
            Ok(RetryOutcome::Accepted {
                value: "ok",
                attempts: 2
            })
        );
        assert_eq!(calls, 2);
    }

    #[test]
    fn weak_attempts_exhaust_the_budget() {
        let mut calls = 0;
        let outcome: Result<RetryOutcome<()>, ()> = retry_bounded(3, |_| {
            calls += 1;
            Ok(Attempt::Weak)
        });
        assert_eq!(outcome, Ok(RetryOutcome::Exhausted { attempts: 3 }));
        assert_eq!(calls, 3);
    }

    #[test]
    fn error_aborts_without_further_attempts() {
        let mut calls = 0;
        let outcome: Result<RetryOutcome<()>, &str> = retry_bounded(3, |_| {
            calls += 1;
            Err("boom")
        });
        assert_eq!(outcome, Err("boom"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_budget_still_tries_once() {
        let mut calls = 0;
        let outcome: Result<RetryOutcome<()>, ()> = retry_bounded(0, |_| {
            calls += 1;
            Ok(Attempt::Weak)
        });
        assert_eq!(outcome, Ok(RetryOutcome::Exhausted { attempts: 1 }));
        assert_eq!(calls, 1);
    }
}
