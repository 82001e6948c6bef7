use scl_sim::stdlib::fbs::{FbInstance, FbKind, Tof, Ton, Tonr, Tp};
use scl_sim::value::Value;

#[test]
fn ton_output_rises_exactly_at_preset() {
    let mut ton = Ton::new();
    let pt = 1_000;

    let out = ton.step(false, pt, 0);
    assert!(!out.q);
    assert_eq!(out.et, 0);

    let start = 5_000;
    for now in (start..start + i64::from(pt)).step_by(10) {
        let out = ton.step(true, pt, now);
        assert!(!out.q, "Q rose early at {now}");
        assert!(out.et < pt);
    }

    let out = ton.step(true, pt, start + i64::from(pt));
    assert!(out.q);
    assert_eq!(out.et, pt);

    let out = ton.step(true, pt, start + 10 * i64::from(pt));
    assert!(out.q);
    assert_eq!(out.et, pt, "ET never exceeds PT");

    let out = ton.step(false, pt, start + 11 * i64::from(pt));
    assert!(!out.q);
    assert_eq!(out.et, 0);
}

#[test]
fn tof_and_tp() {
    let mut tof = Tof::new();
    let mut tp = Tp::new();
    let pt = 100;

    assert!(tof.step(true, pt, 0).q);
    let out = tof.step(false, pt, 10);
    assert!(out.q);
    assert_eq!(out.et, 0);
    let out = tof.step(false, pt, 60);
    assert!(out.q);
    assert_eq!(out.et, 50);
    assert!(!tof.step(false, pt, 110).q);

    assert!(!tp.step(false, pt, 0).q);
    assert!(tp.step(true, pt, 10).q);
    assert!(tp.step(false, pt, 50).q);
    let out = tp.step(true, pt, 110);
    assert!(!out.q);
    assert_eq!(out.et, pt);
    assert!(!tp.step(false, pt, 120).q);
    assert!(tp.step(true, pt, 130).q);
}

#[test]
fn tonr_keeps_elapsed_time_until_reset() {
    let mut tonr = Tonr::new();
    let pt = 100;

    tonr.step(true, false, pt, 0);
    assert_eq!(tonr.step(true, false, pt, 60).et, 60);
    assert_eq!(tonr.step(false, false, pt, 200).et, 60);
    tonr.step(true, false, pt, 300);
    let out = tonr.step(true, false, pt, 340);
    assert!(out.q);
    assert_eq!(out.et, pt);

    let out = tonr.step(true, true, pt, 400);
    assert!(!out.q);
    assert_eq!(out.et, 0);
}

#[test]
fn timer_instance_uses_stored_inputs() {
    let mut timer = FbInstance::new(FbKind::Ton);
    timer.set_input("PT", &Value::Int(50)).unwrap();
    timer.set_input("IN", &Value::Bool(true)).unwrap();
    timer.execute(1_000);
    assert_eq!(timer.get("Q"), Some(Value::Bool(false)));
    timer.execute(1_050);
    assert_eq!(timer.get("Q"), Some(Value::Bool(true)));
    assert_eq!(timer.get("ET"), Some(Value::Int(50)));
    assert_eq!(timer.get("IN"), Some(Value::Bool(true)));
}
