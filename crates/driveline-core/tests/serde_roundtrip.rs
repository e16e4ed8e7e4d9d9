#![cfg(feature = "serde")]

use driveline_core::{Controls, NitroUsage, ProbabilityCurve, SkidCommand, SkillTier};

#[test]
fn skill_tier_roundtrips() {
    let tier = SkillTier::hard();
    let json = serde_json::to_string(&tier).expect("serialize");
    let back: SkillTier = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, tier);
    assert_eq!(back.nitro_usage, NitroUsage::All);
}

#[test]
fn probability_curve_roundtrips() {
    let curve = ProbabilityCurve::new(vec![(10.0, 0.2), (40.0, 0.9)]);
    let json = serde_json::to_string(&curve).expect("serialize");
    let back: ProbabilityCurve = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, curve);
    assert!((back.eval(25.0) - 0.55).abs() < 1e-6);
}

#[test]
fn controls_roundtrip() {
    let controls = Controls {
        steer: -0.4,
        accel: 1.0,
        skid: SkidCommand::Right,
        nitro: true,
        ..Controls::default()
    };
    let json = serde_json::to_string(&controls).expect("serialize");
    let back: Controls = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, controls);
}
