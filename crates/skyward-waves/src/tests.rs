use std::cell::RefCell;
use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::DVec2;

use skyward_core::components::{CollisionLayer, Ship};
use skyward_core::config::{FormationConfig, LevelConfig, SpawnDirective, TacticConfig};
use skyward_core::events::WaveEvent;

use crate::formation::FormationSetup;
use crate::level::Level;
use crate::runner::{RunnerState, WaveRunner};
use crate::stage::{ShipFactory, Stage, StageConfig};
use crate::tactic::Tactic;

fn stage() -> Stage {
    Stage::new(StageConfig::default())
}

fn directive(json: &str) -> SpawnDirective {
    serde_json::from_str(json).unwrap()
}

fn formation(json: &str) -> FormationConfig {
    serde_json::from_str(json).unwrap()
}

fn native(config: FormationConfig) -> Tactic {
    let mut tactic = Tactic::from_config(&TacticConfig::Native);
    tactic.initialize(FormationSetup {
        config,
        ships: Vec::new(),
        layer: CollisionLayer::Hostile,
    });
    tactic
}

/// Explicit single ship at the top center, moved by its own descent.
const SINGLE: &str = r#"{
    "tactic": { "type": "Native" },
    "formation": { "type": "Explicit", "placements": [ { "x": 0.5, "y": 0.1 } ] }
}"#;

fn kill_all(stage: &mut Stage) {
    for (_, ship) in stage.world.query_mut::<&mut Ship>() {
        ship.active = false;
    }
}

fn count_spawned(events: &[WaveEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, WaveEvent::ShipSpawned { .. }))
        .count()
}

fn count_shots(events: &[WaveEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, WaveEvent::Shot { .. }))
        .count()
}

fn distinct_rows(ys: impl Iterator<Item = f64>) -> usize {
    let mut ys: Vec<f64> = ys.collect();
    ys.sort_by(|a, b| a.total_cmp(b));
    ys.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    ys.len()
}

// --- Formations ---

#[test]
fn test_grid_one_two_heads_straight_down() {
    let mut stage = stage();
    let mut tactic = native(formation(
        r#"{ "type": "Grid", "rows": [1, 2], "spacing": 80,
             "start_width_fraction": 0.5, "end_width_fraction": 0.5 }"#,
    ));
    tactic.spawn(&mut stage, 0.0);

    let members = tactic.formations()[0].members();
    assert_eq!(members.len(), 3);
    assert_eq!(distinct_rows(members.iter().map(|m| m.start.y)), 2);
    let starts: Vec<DVec2> = members.iter().map(|m| m.start).collect();
    let expected = [
        DVec2::new(400.0, -60.0),
        DVec2::new(360.0, -120.0),
        DVec2::new(440.0, -120.0),
    ];
    for (start, want) in starts.iter().zip(expected) {
        assert!((*start - want).length() < 1e-9, "{:?} != {:?}", start, want);
    }

    tactic.update(&mut stage, 16.0, 16.0);
    for member in tactic.formations()[0].members() {
        let pose = stage.transform(member.entity).unwrap();
        assert!((pose.rotation - FRAC_PI_2).abs() < 1e-12);
    }
}

#[test]
fn test_grid_cells_skip_null() {
    let mut stage = stage();
    let mut tactic = native(formation(
        r#"{ "type": "Grid", "rows": [
            [{ "kind": "a" }, null, { "kind": "b" }],
            [null, { "kind": "c" }, null],
            [{ "kind": "d" }]
        ] }"#,
    ));
    tactic.spawn(&mut stage, 0.0);
    let members = tactic.formations()[0].members();
    assert_eq!(members.len(), 4);
    assert_eq!(distinct_rows(members.iter().map(|m| m.start.y)), 3);
}

#[test]
fn test_tilted_grid_faces_travel() {
    let mut stage = stage();
    let mut tactic = native(formation(
        r#"{ "type": "Grid", "rows": [1, 2], "spacing": 80, "row_spacing": 60,
             "start_width_fraction": 0.25, "end_width_fraction": 0.75 }"#,
    ));
    tactic.spawn(&mut stage, 0.0);

    let travel = 660.0_f64.atan2(400.0);
    let forward = DVec2::from_angle(travel);
    let members = tactic.formations()[0].members();
    assert_eq!(members.len(), 3);
    let front = members[0].start;
    assert!((front - DVec2::new(200.0, -60.0)).length() < 1e-9);

    // The rear row sits square behind the front, across the travel line.
    let (left, right) = (members[1].start, members[2].start);
    assert!((right - left).dot(forward).abs() < 1e-9);
    assert!(((right - left).length() - 80.0).abs() < 1e-9);
    let rear_center = (left + right) / 2.0;
    assert!((rear_center - (front - forward * 60.0)).length() < 1e-9);

    tactic.update(&mut stage, 16.0, 16.0);
    for member in tactic.formations()[0].members() {
        let pose = stage.transform(member.entity).unwrap();
        assert!((pose.rotation - travel).abs() < 1e-12);
    }
}

#[test]
fn test_field_variant_index_wraps() {
    let mut stage = stage();
    let mut tactic = Tactic::from_config(&TacticConfig::Native);
    tactic.initialize(FormationSetup {
        config: formation(
            r#"{ "type": "Field", "count": 5, "variants": [ { "weight": 1.0, "config": 3 } ] }"#,
        ),
        ships: vec![
            serde_json::from_str(r#"{ "kind": "rock" }"#).unwrap(),
            serde_json::from_str(r#"{ "kind": "mine" }"#).unwrap(),
        ],
        layer: CollisionLayer::Hazard,
    });
    tactic.spawn(&mut stage, 0.0);

    let members = tactic.formations()[0].members();
    assert_eq!(members.len(), 5);
    for member in members {
        let ship = stage.world.get::<&Ship>(member.entity).unwrap();
        assert_eq!(ship.kind, "mine");
    }
}

#[test]
fn test_line_fills_screen_width() {
    let mut stage = stage();
    let mut tactic = native(formation(r#"{ "type": "Line", "spacing": 64, "zigzag": 20 }"#));
    tactic.spawn(&mut stage, 0.0);
    let members = tactic.formations()[0].members();
    assert_eq!(members.len(), 12);
    assert_eq!(distinct_rows(members.iter().map(|m| m.start.y)), 2);
}

#[test]
fn test_sinus_formation_is_replayable() {
    let run = || {
        let mut stage = stage();
        let mut tactic = native(formation(r#"{ "type": "Sinus", "count": 5 }"#));
        tactic.spawn(&mut stage, 0.0);
        // Uneven frame times must not change where the ships end up.
        let mut time = 0.0;
        for delta in [16.0, 33.0, 7.0, 50.0, 16.0, 94.0] {
            time += delta;
            tactic.update(&mut stage, time, delta);
        }
        tactic.formations()[0]
            .members()
            .iter()
            .map(|m| stage.transform(m.entity).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_field_scatter_is_seeded() {
    let run = |seed| {
        let mut stage = Stage::new(StageConfig {
            seed,
            ..Default::default()
        });
        let mut tactic = native(formation(r#"{ "type": "Field", "count": 6 }"#));
        tactic.spawn(&mut stage, 0.0);
        tactic.formations()[0]
            .members()
            .iter()
            .map(|m| m.start)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
    for start in run(7) {
        assert!(start.y <= 0.0, "staged above the screen: {:?}", start);
        assert!(start.x >= 80.0 && start.x <= 720.0);
    }
}

#[test]
fn test_members_reaped_lazily() {
    let mut stage = stage();
    let mut tactic = native(formation(r#"{ "type": "Line", "count": 3 }"#));
    tactic.spawn(&mut stage, 0.0);
    let victim = tactic.formations()[0].members()[0].entity;
    stage.world.get::<&mut Ship>(victim).unwrap().active = false;

    assert_eq!(tactic.formations()[0].members().len(), 3);
    tactic.update(&mut stage, 16.0, 16.0);
    assert_eq!(tactic.formations()[0].members().len(), 2);
    assert!(tactic.formations()[0]
        .members()
        .iter()
        .all(|m| m.entity != victim));
}

#[test]
fn test_tactic_completes_after_roster_empties() {
    let mut stage = stage();
    let mut tactic = native(formation(r#"{ "type": "Line", "count": 2 }"#));
    tactic.spawn(&mut stage, 0.0);
    kill_all(&mut stage);

    tactic.update(&mut stage, 16.0, 16.0);
    assert!(tactic.formations()[0].is_complete());
    assert!(!tactic.is_complete());
    tactic.update(&mut stage, 32.0, 16.0);
    assert!(tactic.is_complete());
}

// --- Fire plans ---

#[test]
fn test_volley_fires_fixed_count() {
    let mut stage = stage();
    let mut tactic = Tactic::from_config(&TacticConfig::Native);
    tactic.initialize(FormationSetup {
        config: formation(r#"{ "type": "Explicit", "placements": [ { "x": 0.5, "y": 0.1 } ] }"#),
        ships: vec![serde_json::from_str(
            r#"{ "weapon": { "mode": { "type": "Volley", "shots": 3,
                 "initial_delay_ms": 100, "spacing_ms": 100 } } }"#,
        )
        .unwrap()],
        layer: CollisionLayer::Hostile,
    });
    tactic.spawn(&mut stage, 0.0);
    stage.drain_events();

    let mut time = 0.0;
    while time < 1000.0 {
        time += 16.0;
        tactic.update(&mut stage, time, 16.0);
    }
    assert_eq!(count_shots(&stage.drain_events()), 3);
}

#[test]
fn test_continuous_fire_stops_with_ship() {
    let mut stage = stage();
    let mut tactic = Tactic::from_config(&TacticConfig::Native);
    tactic.initialize(FormationSetup {
        config: formation(r#"{ "type": "Explicit", "placements": [ { "x": 0.5, "y": 0.1 } ] }"#),
        ships: vec![serde_json::from_str(
            r#"{ "weapon": { "mode": { "type": "Continuous", "interval_ms": 100 } } }"#,
        )
        .unwrap()],
        layer: CollisionLayer::Hostile,
    });
    tactic.spawn(&mut stage, 0.0);

    let mut time = 0.0;
    for _ in 0..5 {
        time += 100.0;
        tactic.update(&mut stage, time, 100.0);
    }
    assert_eq!(count_shots(&stage.drain_events()), 5);

    kill_all(&mut stage);
    for _ in 0..5 {
        time += 100.0;
        tactic.update(&mut stage, time, 100.0);
    }
    assert_eq!(count_shots(&stage.drain_events()), 0);
}

#[test]
fn test_zero_chance_never_fires() {
    let mut stage = stage();
    let mut tactic = Tactic::from_config(&TacticConfig::Native);
    tactic.initialize(FormationSetup {
        config: formation(r#"{ "type": "Line", "count": 6 }"#),
        ships: vec![serde_json::from_str(
            r#"{ "weapon": { "chance": 0.0,
                 "mode": { "type": "Continuous", "interval_ms": 50 } } }"#,
        )
        .unwrap()],
        layer: CollisionLayer::Hostile,
    });
    tactic.spawn(&mut stage, 0.0);
    let mut time = 0.0;
    for _ in 0..20 {
        time += 50.0;
        tactic.update(&mut stage, time, 50.0);
    }
    assert_eq!(count_shots(&stage.drain_events()), 0);
}

// --- Runner ---

#[test]
fn test_zero_delay_spawn_is_deferred() {
    let mut stage = stage();
    let mut runner = WaveRunner::new("r", directive(SINGLE));
    assert_eq!(runner.state(), RunnerState::Delay);
    assert_eq!(stage.world.len(), 0);

    runner.update(&mut stage, 16.0, 16.0);
    assert_eq!(runner.state(), RunnerState::Running);
    assert_eq!(stage.world.len(), 1);
}

#[test]
fn test_start_delay_holds_spawn() {
    let mut stage = stage();
    let mut d = directive(SINGLE);
    d.start_delay_ms = 500.0;
    let mut runner = WaveRunner::new("r", d);

    runner.update(&mut stage, 400.0, 400.0);
    assert_eq!(runner.state(), RunnerState::Delay);
    assert_eq!(stage.world.len(), 0);
    runner.update(&mut stage, 500.0, 100.0);
    assert_eq!(runner.state(), RunnerState::Running);
    assert_eq!(stage.world.len(), 1);
}

#[test]
fn test_runner_finishes_once_tactic_completes() {
    let mut stage = stage();
    let mut runner = WaveRunner::new("wave-a", directive(SINGLE));
    runner.update(&mut stage, 16.0, 16.0);
    kill_all(&mut stage);

    let mut time = 16.0;
    for _ in 0..3 {
        time += 16.0;
        runner.update(&mut stage, time, 16.0);
    }
    assert!(runner.is_finished());
    assert!(runner.tactic().is_none());
    let events = stage.drain_events();
    assert!(events.contains(&WaveEvent::RunnerFinished {
        label: "wave-a".into()
    }));
}

#[test]
fn test_repeat_waits_for_completion_and_interval() {
    let mut stage = stage();
    let mut d = directive(SINGLE);
    d.repeat = Some(skyward_core::config::Repeat {
        count: 2,
        interval_ms: 500.0,
    });
    let mut runner = WaveRunner::new("r", d);
    assert_eq!(runner.instances(), 2);

    let mut spawned = 0;
    let mut completed_at = None;
    let mut second_at = None;
    let mut time = 0.0;
    while time < 3000.0 && !runner.is_finished() {
        time += 100.0;
        runner.update(&mut stage, time, 100.0);
        spawned += count_spawned(&stage.drain_events());

        if time == 200.0 {
            kill_all(&mut stage);
        }
        if spawned == 1 && runner.tactic().is_none() && completed_at.is_none() {
            completed_at = Some(time);
            assert_eq!(runner.state(), RunnerState::Running);
        }
        if spawned == 2 && second_at.is_none() {
            second_at = Some(time);
            kill_all(&mut stage);
        }
    }

    let completed_at = completed_at.unwrap();
    let second_at = second_at.unwrap();
    assert!(second_at - completed_at >= 500.0);
    assert!(runner.is_finished());
    assert_eq!(spawned, 2);
}

#[test]
fn test_runner_destroy_is_idempotent() {
    let mut stage = stage();
    let mut runner = WaveRunner::new("r", directive(SINGLE));
    runner.update(&mut stage, 16.0, 16.0);
    assert_eq!(stage.world.len(), 1);

    runner.destroy(&mut stage);
    runner.destroy(&mut stage);
    assert_eq!(stage.world.len(), 0);
    assert!(runner.is_finished());
}

#[test]
fn test_destroy_before_spawn_cancels_it() {
    let mut stage = stage();
    let mut runner = WaveRunner::new("r", directive(SINGLE));
    runner.destroy(&mut stage);
    runner.update(&mut stage, 16.0, 16.0);
    assert_eq!(stage.world.len(), 0);
}

// --- Level ---

fn level(json: &str) -> Level {
    let config: LevelConfig = serde_json::from_str(json).unwrap();
    Level::new(config)
}

const TWO_STEPS: &str = r#"{
    "name": "two-steps",
    "steps": [
        [
            { "tactic": { "type": "Native" },
              "formation": { "type": "Explicit", "placements": [ { "x": 0.3, "y": 0.1 } ] } },
            { "tactic": { "type": "Native" },
              "formation": { "type": "Explicit", "placements": [ { "x": 0.7, "y": 0.1 } ] } }
        ],
        [
            { "tactic": { "type": "Native" },
              "formation": { "type": "Explicit", "placements": [ { "x": 0.5, "y": 0.1 } ] } }
        ]
    ]
}"#;

fn first_entity(level: &Level, runner: usize) -> hecs::Entity {
    level.active_runners()[runner]
        .tactic()
        .unwrap()
        .formations()[0]
        .members()[0]
        .entity
}

#[test]
fn test_step_waits_for_every_parallel_runner() {
    let mut stage = stage();
    let mut level = level(TWO_STEPS);
    level.start(&mut stage);
    assert_eq!(level.active_runners().len(), 2);

    let mut time = 16.0;
    level.update(&mut stage, time, 16.0);
    let first = first_entity(&level, 0);
    stage.world.get::<&mut Ship>(first).unwrap().active = false;

    for _ in 0..5 {
        time += 16.0;
        level.update(&mut stage, time, 16.0);
    }
    assert_eq!(level.current_step(), 0);
    assert_eq!(level.active_runners().len(), 1);

    kill_all(&mut stage);
    for _ in 0..3 {
        time += 16.0;
        level.update(&mut stage, time, 16.0);
    }
    assert_eq!(level.current_step(), 1);

    let events = stage.drain_events();
    assert!(events.contains(&WaveEvent::StepStarted { step: 0, runners: 2 }));
    assert!(events.contains(&WaveEvent::StepStarted { step: 1, runners: 1 }));
}

#[test]
fn test_directive_without_tactic_is_skipped() {
    let mut stage = stage();
    let mut level = level(
        r#"{
        "name": "gap",
        "steps": [
            [ { "formation": { "type": "Line", "count": 4 } } ],
            [ { "tactic": { "type": "Native" }, "formation": { "type": "Line", "count": 2 } },
              { "formation": { "type": "Line", "count": 4 } } ]
        ]
    }"#,
    );
    level.start(&mut stage);
    assert!(level.active_runners().is_empty());

    level.update(&mut stage, 16.0, 16.0);
    assert_eq!(level.current_step(), 1);
    assert_eq!(level.active_runners().len(), 1);
    level.update(&mut stage, 32.0, 16.0);
    assert_eq!(stage.world.len(), 2);
}

#[test]
fn test_level_completes_once_and_calls_back() {
    let mut stage = stage();
    let mut level = level(TWO_STEPS);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = calls.clone();
    level.on_complete(move |name| sink.borrow_mut().push(name.to_string()));
    level.start(&mut stage);

    let mut time = 0.0;
    for _ in 0..20 {
        time += 16.0;
        level.update(&mut stage, time, 16.0);
        kill_all(&mut stage);
    }
    assert!(level.is_complete());
    assert_eq!(*calls.borrow(), vec!["two-steps".to_string()]);
    assert!(stage.drain_events().contains(&WaveEvent::LevelComplete {
        name: "two-steps".into()
    }));

    level.update(&mut stage, time + 16.0, 16.0);
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn test_looping_level_restarts_at_step_zero() {
    let mut stage = stage();
    let mut config: LevelConfig = serde_json::from_str(TWO_STEPS).unwrap();
    config.looping = true;
    let mut level = Level::new(config);
    let called = Rc::new(RefCell::new(false));
    let flag = called.clone();
    level.on_complete(move |_| *flag.borrow_mut() = true);
    level.start(&mut stage);

    let mut time = 0.0;
    while level.loops_completed() == 0 && time < 2000.0 {
        time += 16.0;
        level.update(&mut stage, time, 16.0);
        kill_all(&mut stage);
    }
    assert_eq!(level.loops_completed(), 1);
    assert_eq!(level.current_step(), 0);
    assert!(!level.is_complete());
    assert!(!*called.borrow());
    assert!(stage
        .drain_events()
        .contains(&WaveEvent::LevelLooped { loops: 1 }));
}

#[test]
fn test_level_destroy_tears_everything_down() {
    let mut stage = stage();
    let mut level = level(
        r#"{
        "name": "teardown",
        "steps": [[
            { "tactic": { "type": "Native" }, "formation": { "type": "Line", "count": 3 },
              "ships": [ { "weapon": { "mode": { "type": "Continuous", "interval_ms": 50 } } } ] },
            { "tactic": { "type": "Native" }, "formation": { "type": "Line", "count": 3 },
              "start_delay_ms": 1000 }
        ]]
    }"#,
    );
    level.start(&mut stage);
    level.update(&mut stage, 16.0, 16.0);
    level.update(&mut stage, 116.0, 100.0);
    assert_eq!(stage.world.len(), 3);

    level.destroy(&mut stage);
    assert_eq!(stage.world.len(), 0);
    assert!(level.active_runners().is_empty());
    stage.drain_events();

    let mut time = 116.0;
    for _ in 0..30 {
        time += 100.0;
        level.update(&mut stage, time, 100.0);
    }
    assert_eq!(stage.world.len(), 0);
    assert!(stage.drain_events().is_empty());
}

#[test]
fn test_path_level_runs_end_to_end() {
    let mut stage = stage();
    stage.set_target(crate::stage::FixedPoint(DVec2::new(400.0, 500.0)));
    let config = LevelConfig::from_json(
        r#"{
        "name": "dive",
        "steps": [[{
            "tactic": { "type": "Path", "segments": [
                { "type": "Point", "x": 0.5, "y": 0.0 },
                { "type": "Intercept", "approach": 1.0, "fallback_x": 0.5, "fallback_y": 1.0 },
                { "type": "Point", "x": 0.5, "y": 2.0 }
            ], "on_end": "Continue" },
            "formation": { "type": "Explicit", "placements": [
                { "x": 0.45, "y": -0.05 }, { "x": 0.55, "y": -0.05 }
            ] }
        }]]
    }"#,
    )
    .unwrap();
    let mut level = Level::new(config);
    level.start(&mut stage);

    // Ships fly down through the target and get culled off the bottom.
    let mut time = 0.0;
    while !level.is_complete() && time < 30_000.0 {
        time += 16.0;
        level.update(&mut stage, time, 16.0);
    }
    assert!(level.is_complete());
    let events = stage.drain_events();
    let culled = events
        .iter()
        .filter(|e| matches!(e, WaveEvent::ShipCulled { .. }))
        .count();
    assert_eq!(culled, 2);
}

#[test]
fn test_sinus_tactic_weaves_within_amplitude() {
    let mut stage = stage();
    let mut tactic = Tactic::from_config(&TacticConfig::Sinus(
        skyward_core::config::SinusTacticConfig {
            amplitude: 50.0,
            frequency: 3.0,
            phase_step: 0.5,
        },
    ));
    tactic.initialize(FormationSetup {
        config: formation(r#"{ "type": "Line", "count": 3 }"#),
        ships: Vec::new(),
        layer: CollisionLayer::Hostile,
    });
    tactic.spawn(&mut stage, 0.0);

    let mut time = 0.0;
    for _ in 0..60 {
        time += 16.0;
        tactic.update(&mut stage, time, 16.0);
        for member in tactic.formations()[0].members() {
            let pose = stage.transform(member.entity).unwrap();
            assert!((pose.position.x - member.start.x).abs() <= 50.0 + 1e-9);
            // Always heading down the screen.
            assert!(pose.rotation > 0.0 && pose.rotation < std::f64::consts::PI);
        }
    }
}

/// Refuses every ship of one kind.
struct Picky(&'static str);

impl ShipFactory for Picky {
    fn spawn(
        &self,
        world: &mut hecs::World,
        position: DVec2,
        config: &skyward_core::config::ShipConfig,
        layer: CollisionLayer,
    ) -> Result<hecs::Entity, skyward_core::error::SpawnError> {
        if config.kind == self.0 {
            return Err(skyward_core::error::SpawnError::Rejected(config.kind.clone()));
        }
        crate::stage::StandardShipFactory.spawn(world, position, config, layer)
    }
}

#[test]
fn test_factory_failures_leave_fewer_ships() {
    let mut stage = stage();
    stage.set_factory(Picky("mine"));
    let mut tactic = Tactic::from_config(&TacticConfig::Native);
    tactic.initialize(FormationSetup {
        config: formation(r#"{ "type": "Line", "count": 4 }"#),
        ships: vec![
            serde_json::from_str(r#"{ "kind": "drone" }"#).unwrap(),
            serde_json::from_str(r#"{ "kind": "mine" }"#).unwrap(),
        ],
        layer: CollisionLayer::Hazard,
    });
    tactic.spawn(&mut stage, 0.0);

    let members = tactic.formations()[0].members();
    assert_eq!(members.len(), 2);
    let slots: Vec<usize> = members.iter().map(|m| m.slot).collect();
    assert_eq!(slots, vec![0, 1]);
    assert_eq!(count_spawned(&stage.drain_events()), 2);
    tactic.update(&mut stage, 16.0, 16.0);
    assert!(!tactic.is_complete());
}
