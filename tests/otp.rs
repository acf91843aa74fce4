use storefront_api::otp::{CODE_LEN, CodeBuffer, OtpEvent, OtpFlow, RESEND_COOLDOWN_SECS};

fn type_code(mut flow: OtpFlow, code: &str) -> OtpFlow {
    for ch in code.chars() {
        flow = flow.apply(OtpEvent::Digit(ch.to_digit(10).unwrap() as u8));
    }
    flow
}

#[test]
fn request_and_accept_starts_the_cooldown() {
    let flow = OtpFlow::new().apply(OtpEvent::RequestCode);
    assert_eq!(flow, OtpFlow::CodeRequested);

    let flow = flow.apply(OtpEvent::SendAccepted);
    assert_eq!(flow.resend_in(), Some(RESEND_COOLDOWN_SECS));
    assert!(!flow.resend_available());
}

#[test]
fn send_rejection_returns_to_idle() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendRejected {
            message: "rate limited".into(),
        });
    assert_eq!(flow, OtpFlow::Idle);
    assert!(flow.resend_available());
}

#[test]
fn incomplete_buffer_rejects_submit_locally() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);
    let flow = type_code(flow, "123");

    let after = flow.clone().apply(OtpEvent::Submit);
    // State unchanged means nothing was sent.
    assert_eq!(after, flow);
    assert_eq!(after.label(), "awaiting_input");
}

#[test]
fn complete_buffer_submits_the_entered_code() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);
    let flow = type_code(flow, "123456").apply(OtpEvent::Submit);

    match flow {
        OtpFlow::Submitting { ref code, .. } => assert_eq!(code, "123456"),
        ref other => panic!("expected Submitting, got {other:?}"),
    }
}

#[test]
fn buffer_ignores_overflow_and_non_digits() {
    let mut buffer = CodeBuffer::empty();
    for digit in [1, 2, 3, 4, 5, 6, 7, 8] {
        buffer.push(digit);
    }
    assert_eq!(buffer.code().unwrap().len(), CODE_LEN);
    assert_eq!(buffer.code().unwrap(), "123456");

    let mut buffer = CodeBuffer::empty();
    buffer.push(12);
    assert!(!buffer.is_complete());

    buffer.push(9);
    buffer.pop();
    assert_eq!(buffer, CodeBuffer::empty());
}

#[test]
fn cooldown_decreases_once_per_tick_and_reenables_resend() {
    let mut flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);

    let mut last = flow.resend_in().unwrap();
    for _ in 0..RESEND_COOLDOWN_SECS {
        assert!(!flow.resend_available());
        flow = flow.apply(OtpEvent::Tick);
        let now = flow.resend_in().unwrap();
        assert_eq!(now, last - 1);
        last = now;
    }

    assert_eq!(flow.resend_in(), Some(0));
    assert!(flow.resend_available());

    // Ticking past zero saturates.
    let flow = flow.apply(OtpEvent::Tick);
    assert_eq!(flow.resend_in(), Some(0));
}

#[test]
fn resend_is_ignored_while_cooldown_is_running() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);
    assert!(flow.resend_in().unwrap() > 0);

    let after = flow.clone().apply(OtpEvent::RequestCode);
    assert_eq!(after, flow);

    // Once the timer runs out the same event is honored.
    let mut flow = flow;
    for _ in 0..RESEND_COOLDOWN_SECS {
        flow = flow.apply(OtpEvent::Tick);
    }
    assert_eq!(flow.apply(OtpEvent::RequestCode), OtpFlow::CodeRequested);
}

#[test]
fn cooldown_ticks_independently_of_submission() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);
    let flow = type_code(flow, "000000").apply(OtpEvent::Submit);

    let before = flow.resend_in().unwrap();
    let flow = flow.apply(OtpEvent::Tick);
    assert_eq!(flow.resend_in(), Some(before - 1));
    assert_eq!(flow.label(), "submitting");
}

#[test]
fn verification_with_continuation_routes_to_reset() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);
    let flow = type_code(flow, "123456")
        .apply(OtpEvent::Submit)
        .apply(OtpEvent::VerifyPassed {
            continuation: Some("reset-token".into()),
        });

    assert_eq!(
        flow,
        OtpFlow::Verified {
            continuation: Some("reset-token".into())
        }
    );
}

#[test]
fn verification_without_continuation_routes_to_sign_in() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);
    let flow = type_code(flow, "123456")
        .apply(OtpEvent::Submit)
        .apply(OtpEvent::VerifyPassed { continuation: None });

    assert_eq!(flow, OtpFlow::Verified { continuation: None });
}

#[test]
fn rejected_code_fails_and_reenters_input_on_next_digit() {
    let flow = OtpFlow::new()
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::SendAccepted);
    let flow = type_code(flow, "999999")
        .apply(OtpEvent::Submit)
        .apply(OtpEvent::VerifyRejected {
            message: "Incorrect code".into(),
        });
    assert_eq!(flow.label(), "failed");

    // The first keystroke after a failure starts a fresh buffer.
    let flow = flow.apply(OtpEvent::Digit(4));
    match flow {
        OtpFlow::AwaitingInput { ref buffer, .. } => {
            let mut expected = CodeBuffer::empty();
            expected.push(4);
            assert_eq!(buffer, &expected);
        }
        ref other => panic!("expected AwaitingInput, got {other:?}"),
    }
}

#[test]
fn late_verify_response_outside_submitting_is_ignored() {
    // Navigating away abandons the in-flight submission; a response that
    // arrives afterwards must not change state.
    let awaiting = OtpFlow::awaiting(10);
    let after = awaiting.clone().apply(OtpEvent::VerifyPassed {
        continuation: Some("stale".into()),
    });
    assert_eq!(after, awaiting);

    let idle = OtpFlow::Idle.apply(OtpEvent::VerifyRejected {
        message: "stale".into(),
    });
    assert_eq!(idle, OtpFlow::Idle);

    let verified = OtpFlow::Verified { continuation: None };
    let after = verified.clone().apply(OtpEvent::VerifyRejected {
        message: "stale".into(),
    });
    assert_eq!(after, verified);
}

#[test]
fn verified_is_terminal() {
    let flow = OtpFlow::Verified {
        continuation: Some("token".into()),
    };
    let flow = flow
        .apply(OtpEvent::Digit(1))
        .apply(OtpEvent::Submit)
        .apply(OtpEvent::RequestCode)
        .apply(OtpEvent::Tick);
    assert_eq!(
        flow,
        OtpFlow::Verified {
            continuation: Some("token".into())
        }
    );
}
