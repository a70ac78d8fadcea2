use std::collections::HashMap;

use spinwheel::api::{build_security_report, build_wheel, spin_wheel, SpinRequest, WheelRequest};
use spinwheel::config::AppConfig;
use spinwheel::incidents::IncidentKind;
use spinwheel::state::AppState;
use spinwheel::types::WheelMode;
use spinwheel::wheel::is_valid_hex_color;

fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// End-to-end flow: create a wheel from messy input, spin it repeatedly,
/// then read the security report.
#[test]
fn test_full_wheel_flow() {
    let state = AppState::new(AppConfig::default());

    // 1. Create a wheel: six segments, only three filled in, one of them
    // hostile and one with a bogus color.
    let request = WheelRequest::from_fields(&fields(&[
        ("count", "6"),
        ("mode", "normal"),
        ("text_0", "Pizza"),
        ("color_0", "#FF6B6B"),
        ("text_1", "<script>alert(1)</script>Sushi"),
        ("color_1", "#4ECDC4"),
        ("text_2", "Tacos"),
        ("color_2", "bright-green"),
    ]));

    let wheel = build_wheel(&state, request).expect("wheel should validate");
    assert!(wheel.success);
    assert_eq!(wheel.mode, WheelMode::Normal);
    assert_eq!(wheel.segments.len(), 6, "length must match requested count");

    // 2. Canonical segment invariants hold for every segment.
    for (i, segment) in wheel.segments.iter().enumerate() {
        assert_eq!(segment.id, i);
        assert!(segment.active);
        assert!(!segment.text.is_empty());
        assert!(is_valid_hex_color(&segment.color), "bad color {:?}", segment.color);
    }

    // 3. The hostile label was sanitized, the missing ones padded.
    assert_eq!(wheel.segments[0].text, "Pizza");
    assert_eq!(wheel.segments[1].text, "Sushi");
    assert_eq!(wheel.segments[3].text, "Option 4");
    assert_eq!(wheel.segments[5].text, "Option 6");

    // 4. The injection and the bad color each left an incident.
    let snapshot = state.incidents.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().any(|i| i.kind == IncidentKind::XssAttempt));
    assert!(snapshot.iter().any(|i| i.kind == IncidentKind::InvalidColor));

    // 5. Spin the round-tripped wheel; every index must be reachable.
    let mut seen = [false; 6];
    for _ in 0..1000 {
        let response = spin_wheel(
            &state,
            SpinRequest {
                segments: wheel.segments.clone(),
            },
        )
        .expect("spin should succeed");

        assert!(response.success);
        assert!(response.winner_index < 6);
        let winner = &wheel.segments[response.winner_index];
        assert_eq!(response.winner.id, winner.id);
        assert_eq!(response.winner.text, winner.text);
        assert_eq!(response.winner.color, winner.color);
        seen[response.winner_index] = true;
    }
    assert!(seen.iter().all(|&s| s), "all segments should win eventually");

    // 6. The security report reflects what happened.
    let report = build_security_report(&state);
    assert_eq!(report.total_incidents, 2);
    assert_eq!(report.recent_incidents, 2);
    assert_eq!(report.incident_types.get("xss_attempt"), Some(&1));
    assert_eq!(report.incident_types.get("invalid_color"), Some(&1));
    assert_eq!(report.security_score, 90);
}

#[test]
fn test_create_wheel_rejects_bad_shape() {
    let state = AppState::new(AppConfig::default());

    let rejection = build_wheel(
        &state,
        WheelRequest::from_fields(&fields(&[("count", "1"), ("mode", "normal")])),
    )
    .unwrap_err();
    assert_eq!(
        rejection.errors,
        vec!["number of segments must be between 2 and 20"]
    );

    let rejection = build_wheel(
        &state,
        WheelRequest::from_fields(&fields(&[("count", "21"), ("mode", "normal")])),
    )
    .unwrap_err();
    assert_eq!(rejection.errors.len(), 1);

    // Bad count and bad mode are both reported, count first.
    let rejection = build_wheel(
        &state,
        WheelRequest::from_fields(&fields(&[("count", "lots"), ("mode", "chaos")])),
    )
    .unwrap_err();
    assert_eq!(rejection.errors.len(), 2);
    assert!(rejection.errors[0].contains("number of segments"));
    assert!(rejection.errors[1].contains("chaos"));
}

#[test]
fn test_create_wheel_defaults_mode_and_accepts_elimination() {
    let state = AppState::new(AppConfig::default());

    let wheel = build_wheel(
        &state,
        WheelRequest::from_fields(&fields(&[("count", "2")])),
    )
    .unwrap();
    assert_eq!(wheel.mode, WheelMode::Normal);

    let wheel = build_wheel(
        &state,
        WheelRequest::from_fields(&fields(&[("count", "3"), ("mode", "elimination")])),
    )
    .unwrap();
    assert_eq!(wheel.mode, WheelMode::Elimination);
    assert!(wheel.segments.iter().all(|s| s.active));
}

#[test]
fn test_spin_revalidates_round_tripped_shape() {
    let state = AppState::new(AppConfig::default());

    let err = spin_wheel(&state, SpinRequest { segments: vec![] }).unwrap_err();
    assert_eq!(err.message, "No segments provided");

    let wheel = build_wheel(
        &state,
        WheelRequest::from_fields(&fields(&[("count", "2")])),
    )
    .unwrap();

    // A client replaying a single segment is below the minimum.
    let err = spin_wheel(
        &state,
        SpinRequest {
            segments: wheel.segments[..1].to_vec(),
        },
    )
    .unwrap_err();
    assert_eq!(err.message, "Invalid number of segments");

    // An inflated list is rejected the same way.
    let mut inflated = Vec::new();
    for _ in 0..11 {
        inflated.extend_from_slice(&wheel.segments);
    }
    let err = spin_wheel(&state, SpinRequest { segments: inflated }).unwrap_err();
    assert_eq!(err.message, "Invalid number of segments");
}

#[test]
fn test_spin_does_not_rewrite_segments() {
    let state = AppState::new(AppConfig::default());

    // Segments round-trip through the client as opaque JSON; the spin
    // endpoint echoes whatever text is stored, without re-sanitizing.
    let wheel = build_wheel(
        &state,
        WheelRequest::from_fields(&fields(&[
            ("count", "2"),
            ("text_0", "Caf\u{e9} con leche"),
            ("color_0", "#F8C471"),
            ("text_1", "Second"),
            ("color_1", "#82E0AA"),
        ])),
    )
    .unwrap();

    let response = spin_wheel(
        &state,
        SpinRequest {
            segments: wheel.segments.clone(),
        },
    )
    .unwrap();
    let expected = &wheel.segments[response.winner_index];
    assert_eq!(response.winner.text, expected.text);
    assert_eq!(response.winner.color, expected.color);
}

#[test]
fn test_security_score_floors_at_fifty_point_penalty() {
    let state = AppState::new(AppConfig::default());
    for _ in 0..30 {
        state
            .incidents
            .record(IncidentKind::RateLimitExceeded, "spin from test");
    }

    let report = build_security_report(&state);
    assert_eq!(report.total_incidents, 30);
    // Penalty caps at 50 regardless of incident volume.
    assert_eq!(report.security_score, 50);
}
