use approx::assert_abs_diff_eq;

use case_session::{CaseSession, SessionError};
use case_types::{Case, ConfigError, FittingsSpec, MaterialSpec, Settings, SupportSpec, Vec3};
use geom_engine::{Fault, GeometryEngine, MockEngine, SolidHandle};
use support_ops::OpError;

/// Helper: a session with one box instrument at the origin.
fn session_with_tube() -> (CaseSession, MockEngine, SolidHandle) {
    let mut engine = MockEngine::new();
    let tube = engine
        .create_block("Tube", Vec3::ZERO, Vec3::new(1.0, 0.2, 0.1))
        .unwrap();
    let mut session = CaseSession::new();
    session.add_instrument(&mut engine, &[tube]).unwrap();
    (session, engine, tube)
}

// ── Instrument Tests ───────────────────────────────────────────────────────

#[test]
fn add_instrument_recomputes_case() {
    let (session, _engine, _) = session_with_tube();
    let case = session.case();
    assert_abs_diff_eq!(case.size.x, 1.02, epsilon = 1e-12);
    assert_abs_diff_eq!(case.base_z, -0.06, epsilon = 1e-12);
    assert_abs_diff_eq!(case.lid_z, 0.06, epsilon = 1e-12);
    assert_eq!(session.instrument_index(), Some(0));
    assert_eq!(session.current_instrument().unwrap().name, "Tube");
}

#[test]
fn add_instrument_needs_new_objects() {
    let (mut session, mut engine, tube) = session_with_tube();
    assert!(!session.can_add_instrument(&[]));
    assert!(!session.can_add_instrument(&[tube]));
    assert!(matches!(
        session.add_instrument(&mut engine, &[tube]),
        Err(SessionError::Unavailable {
            command: "add_instrument"
        })
    ));
    assert_eq!(session.instruments().len(), 1);
}

#[test]
fn repeated_object_in_one_call_is_rejected() {
    let mut engine = MockEngine::new();
    let a = engine.create_block("A", Vec3::ZERO, Vec3::ONE).unwrap();
    let mut session = CaseSession::new();
    assert!(!session.can_add_instrument(&[a, a]));
    assert!(matches!(
        session.add_instrument(&mut engine, &[a, a]),
        Err(SessionError::Unavailable {
            command: "add_instrument"
        })
    ));
    assert!(session.instruments().is_empty());
    assert_eq!(session.instrument_index(), None);
}

#[test]
fn adding_several_instruments_selects_the_last() {
    let mut engine = MockEngine::new();
    let a = engine.create_block("A", Vec3::ZERO, Vec3::ONE).unwrap();
    let b = engine
        .create_block("B", Vec3::new(2.0, 0.0, 0.0), Vec3::ONE)
        .unwrap();
    let mut session = CaseSession::new();
    session.add_instrument(&mut engine, &[a, b]).unwrap();
    assert_eq!(session.instrument_index(), Some(1));
    assert_abs_diff_eq!(session.case().size.x, 3.02, epsilon = 1e-12);

    session.select_instrument(0).unwrap();
    assert_eq!(session.current_instrument().unwrap().name, "A");
    assert!(matches!(
        session.select_instrument(2),
        Err(SessionError::IndexOutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn remove_instrument_deletes_support_solids_and_reselects() {
    let mut engine = MockEngine::new();
    let a = engine
        .create_block("A", Vec3::ZERO, Vec3::new(1.0, 0.2, 0.1))
        .unwrap();
    let b = engine
        .create_block("B", Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.2, 0.1))
        .unwrap();
    let mut session = CaseSession::new();
    session.add_instrument(&mut engine, &[a, b]).unwrap();
    session.add_support().unwrap();
    session.generate_base(&mut engine).unwrap();
    assert_eq!(engine.object_count(), 6);

    session.remove_instrument(&mut engine).unwrap();
    assert_eq!(engine.object_count(), 2);
    assert!(engine.contains(b));
    assert_eq!(session.instrument_index(), Some(0));
    assert_eq!(session.current_instrument().unwrap().name, "A");
    assert_abs_diff_eq!(session.case().size.y, 0.22, epsilon = 1e-12);

    session.remove_instrument(&mut engine).unwrap();
    assert_eq!(session.instrument_index(), None);
    assert_eq!(*session.case(), Case::empty());
    assert!(!session.can_remove_instrument());
}

#[test]
fn failed_solid_delete_keeps_instrument_listed() {
    let (mut session, mut engine, tube) = session_with_tube();
    session.add_support().unwrap();
    let solids = session.generate_base(&mut engine).unwrap();
    engine.inject(Fault::Delete(solids.clamp));

    assert!(session.remove_instrument(&mut engine).is_err());
    assert_eq!(session.instruments().len(), 1);
    assert_eq!(session.instrument_index(), Some(0));
    assert!(engine.contains(solids.clamp));
    assert_eq!(session.current_support().unwrap().solids, Some(solids));

    session.remove_instrument(&mut engine).unwrap();
    assert!(session.instruments().is_empty());
    assert_eq!(engine.names(), vec!["Tube".to_string()]);
    assert!(engine.contains(tube));
}

// ── Support List Tests ─────────────────────────────────────────────────────

#[test]
fn add_support_uses_defaults_but_default_position() {
    let (mut session, _engine, _) = session_with_tube();
    let defaults = SupportSpec {
        position: 0.3,
        thickness: 0.008,
        ..Default::default()
    };
    session.set_support_defaults(defaults).unwrap();
    session.add_support().unwrap();
    let s = session.current_support().unwrap();
    assert_eq!(s.name, "Tube_S0");
    assert_eq!(s.spec.thickness, 0.008);
    assert_eq!(s.spec.position, SupportSpec::default().position);
    assert!(s.solids.is_none());
}

#[test]
fn copy_support_keeps_position() {
    let (mut session, _engine, _) = session_with_tube();
    session.add_support().unwrap();
    session
        .set_support_spec(SupportSpec {
            position: 0.2,
            ..Default::default()
        })
        .unwrap();
    session.copy_support().unwrap();
    let inst = session.current_instrument().unwrap();
    assert_eq!(inst.supports.len(), 2);
    assert_eq!(inst.support_index, Some(1));
    assert_eq!(inst.supports[1].name, "Tube_S1");
    assert_eq!(inst.supports[1].spec.position, 0.2);
}

#[test]
fn support_commands_need_a_current_entry() {
    let mut engine = MockEngine::new();
    let mut session = CaseSession::new();
    assert!(!session.can_add_support());
    assert!(matches!(
        session.add_support(),
        Err(SessionError::Unavailable { .. })
    ));

    let (mut session, _, _) = session_with_tube();
    assert!(!session.can_copy_support());
    assert!(!session.can_remove_support());
    assert!(!session.can_generate());
    assert!(matches!(
        session.generate_base(&mut engine),
        Err(SessionError::Unavailable { .. })
    ));
}

#[test]
fn remove_support_deletes_generated_solids() {
    let (mut session, mut engine, _) = session_with_tube();
    session.add_support().unwrap();
    session.add_support().unwrap();
    session.generate_base(&mut engine).unwrap();
    assert_eq!(engine.object_count(), 5);

    session.remove_support(&mut engine).unwrap();
    assert_eq!(engine.object_count(), 1);
    let inst = session.current_instrument().unwrap();
    assert_eq!(inst.supports.len(), 1);
    assert_eq!(inst.support_index, Some(0));
    assert_eq!(inst.supports[0].name, "Tube_S0");
}

// ── Generation Tests ───────────────────────────────────────────────────────

#[test]
fn generate_stores_solids_and_blocks_regeneration() {
    let (mut session, mut engine, _) = session_with_tube();
    session.add_support().unwrap();
    let solids = session.generate_base(&mut engine).unwrap();
    assert_eq!(session.current_support().unwrap().solids, Some(solids));
    assert_eq!(engine.name(solids.support).unwrap(), "Tube_S0H");

    assert!(!session.can_generate());
    assert!(matches!(
        session.generate_lid(&mut engine),
        Err(SessionError::Unavailable { .. })
    ));
    assert!(matches!(
        session.set_support_spec(SupportSpec::default()),
        Err(SessionError::Unavailable { .. })
    ));
    assert_eq!(engine.object_count(), 5);
}

#[test]
fn remove_geometry_allows_regeneration() {
    let (mut session, mut engine, _) = session_with_tube();
    session.add_support().unwrap();
    assert!(!session.can_remove_support_geometry());
    session.generate_base(&mut engine).unwrap();
    assert!(session.can_remove_support_geometry());

    session.remove_support_geometry(&mut engine).unwrap();
    assert_eq!(engine.object_count(), 1);
    assert!(session.current_support().unwrap().solids.is_none());

    let lid = session.generate_lid(&mut engine).unwrap();
    let b = engine.world_bounds(lid.support).unwrap();
    assert_abs_diff_eq!(b.max.z, session.case().lid_z, epsilon = 1e-9);
}

#[test]
fn generate_applies_pending_instrument_scale() {
    let mut engine = MockEngine::new();
    let tube = engine
        .create_block("Tube", Vec3::ZERO, Vec3::new(0.5, 0.2, 0.1))
        .unwrap();
    engine
        .set_transform(tube, Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0))
        .unwrap();
    let mut session = CaseSession::new();
    session.add_instrument(&mut engine, &[tube]).unwrap();
    session.add_support().unwrap();
    session.generate_base(&mut engine).unwrap();

    assert!(engine.transform(tube).unwrap().is_normalized());
    assert_abs_diff_eq!(engine.dimensions(tube).unwrap().x, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(session.case().size.x, 1.02, epsilon = 1e-12);
}

#[test]
fn failed_generation_leaves_entry_empty() {
    let mut engine = MockEngine::new();
    let stub = engine
        .create_block("Stub", Vec3::ZERO, Vec3::new(0.02, 0.2, 0.1))
        .unwrap();
    let mut session = CaseSession::new();
    session.add_instrument(&mut engine, &[stub]).unwrap();
    session.add_support().unwrap();
    let r = session.generate_base(&mut engine);
    assert!(matches!(
        r,
        Err(SessionError::Op(OpError::Precondition { .. }))
    ));
    assert!(session.current_support().unwrap().solids.is_none());
    assert!(session.can_generate());
    assert_eq!(engine.object_count(), 1);
}

// ── Settings Tests ─────────────────────────────────────────────────────────

#[test]
fn clearance_change_recomputes_case() {
    let (mut session, mut engine, _) = session_with_tube();
    session.set_clearance(&mut engine, 0.03).unwrap();
    assert_abs_diff_eq!(session.case().size.z, 0.16, epsilon = 1e-12);
    assert!(matches!(
        session.set_clearance(&mut engine, 0.5),
        Err(SessionError::Config(ConfigError::AboveMaximum { .. }))
    ));
    assert_eq!(session.settings().clearance, 0.03);
}

#[test]
fn fittings_propagate_into_support_defaults_only() {
    let (mut session, _engine, _) = session_with_tube();
    session.add_support().unwrap();
    let fittings = FittingsSpec {
        screw_diam: 0.006,
        washer_diam: 0.012,
        ..Default::default()
    };
    session.set_fittings(fittings).unwrap();
    assert_eq!(session.settings().support_defaults.screw_diam, 0.006);
    assert_eq!(session.settings().support_defaults.washer_diam, 0.012);
    // existing support untouched
    assert_eq!(
        session.current_support().unwrap().spec.screw_diam,
        SupportSpec::default().screw_diam
    );
    session.add_support().unwrap();
    assert_eq!(session.current_support().unwrap().spec.screw_diam, 0.006);
}

#[test]
fn invalid_settings_are_rejected() {
    let (mut session, _engine, _) = session_with_tube();
    assert!(session
        .set_fittings(FittingsSpec {
            nut_diam: 0.001,
            ..Default::default()
        })
        .is_err());
    assert!(session
        .set_materials(MaterialSpec {
            l_sec_thickness: 0.0,
            ..Default::default()
        })
        .is_err());
    assert!(session
        .set_support_defaults(SupportSpec {
            slot_length: 0.001,
            ..Default::default()
        })
        .is_err());
    assert_eq!(session.settings(), &Settings::default());

    let bad = Settings {
        clearance: 1.0,
        ..Default::default()
    };
    assert!(CaseSession::with_settings(bad).is_err());
}

// ── View Tests ─────────────────────────────────────────────────────────────

#[test]
fn view_serializes_lists_without_handles() {
    let (mut session, mut engine, _) = session_with_tube();
    session.add_support().unwrap();
    session.generate_base(&mut engine).unwrap();
    session.add_support().unwrap();

    let view = session.view();
    assert_eq!(view.instruments.len(), 1);
    let supports = &view.instruments[0].supports;
    assert_eq!(supports.len(), 2);
    assert!(supports[0].generated);
    assert!(!supports[1].generated);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["instruments"][0]["supports"][0]["name"], "Tube_S0");
    assert_eq!(json["instrument_index"], 0);
    assert_eq!(json["clearance"], 0.01);
}
