// vim: tw=80
//! The interception point: route one intercepted call to one expectation.

use std::rc::Rc;

use crate::{
    actions::Step,
    args::call_signature,
    expectation::ExpectationState,
    session::SessionInner,
    target::TargetId,
    Args,
    Error,
    Interceptable,
    Outcome,
    Result,
    Value,
};

/// Handle a call to `method` on the target identified by `target`.
///
/// The registry is only borrowed long enough to snapshot the candidate
/// expectations, so guards, replacements and real methods may call back into
/// the session.
pub(crate) fn dispatch(
    session: &SessionInner,
    target: TargetId,
    method: &str,
    receiver: &dyn Interceptable,
    args: &Args) -> Outcome
{
    let candidates = session.expectations(target, method);
    // Most recently registered first
    let Some(e) = candidates.iter().rev().find(|e| e.matches(args)) else {
        let signature = call_signature(method, args);
        tracing::trace!(call = %signature, "mockwrap::dispatch: no match");
        let msg = match candidates.iter().rev().find_map(|e| e.explain(args)) {
            Some(why) => format!("{signature}\n{why}"),
            None => signature,
        };
        return Err(Error::SignatureMismatch(msg));
    };
    if !e.is_runnable() {
        return Err(Error::StateGuard {
            method: method.to_owned(),
            condition: "condition".to_owned()
        });
    }
    e.call();
    tracing::trace!(
        expectation = %e.signature(),
        args = %args,
        times_called = e.times_called(),
        "mockwrap::dispatch: matched"
    );
    if e.is_ordered() {
        check_order(e, &candidates, args)?;
    }
    match e.next_step() {
        Step::Replace(m) => m.call(receiver, args),
        Step::PassThrough => {
            let outcome = e.original().call(receiver, args);
            e.validate(outcome)
        },
        Step::Yield(stream) => Ok(Value::Stream(stream)),
        Step::Reply(outcome) => outcome,
    }
}

/// Every sibling registered before `e` whose pattern rejects this call must
/// already have been called.
fn check_order(
    e: &ExpectationState,
    siblings: &[Rc<ExpectationState>],
    args: &Args) -> Result<()>
{
    for other in siblings {
        if std::ptr::eq(&**other, e) {
            break;
        }
        let matched = other.matches(args);
        if !matched && other.times_called() == 0 {
            return Err(Error::OrderViolation {
                called: e.signature(),
                expected: other.signature()
            });
        }
        // A sibling without a pattern is a catch-all stub, not a marker.
        if matched && other.has_pattern() {
            break;
        }
    }
    Ok(())
}
