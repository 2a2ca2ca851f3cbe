use std::thread;

use chrono::{TimeZone, Utc};

use saint::{
    EngineConfig, EntityRecord, FactSnapshot, FeasibilityEngine, LiveFacts, OperationalSnapshot,
    PatternCatalog, RuleSet,
};

fn platforms(occupied: bool) -> FactSnapshot {
    FactSnapshot::from_records([
        EntityRecord::new("trains")
            .with("train_number", "123")
            .with("type", "freight")
            .with("status", "on platform")
            .with("crew_id", "B1"),
        EntityRecord::new("platforms")
            .with("platform_number", "5")
            .with("is_occupied", occupied),
    ])
}

#[test]
fn parallel_evaluations_agree() {
    let engine = FeasibilityEngine::new(EngineConfig::default()).unwrap();
    let catalog = PatternCatalog::builtin().unwrap();
    let rules = RuleSet::empty();
    let snapshot = OperationalSnapshot::railway(
        platforms(false),
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    );
    let texts = [
        "transfer train 123 from platform 1 to platform 5",
        "transfer train 999 from platform 1 to platform 5",
        "dispatch train 123",
        "make tea",
    ];

    let expected: Vec<_> = texts
        .iter()
        .map(|t| engine.evaluate(t, &snapshot, &catalog, &rules, &[]).unwrap())
        .collect();

    thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    texts
                        .iter()
                        .map(|t| engine.evaluate(t, &snapshot, &catalog, &rules, &[]).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn snapshot_is_unaffected_by_later_refresh() {
    let engine = FeasibilityEngine::default();
    let catalog = PatternCatalog::builtin().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let text = "transfer train 123 from platform 1 to platform 5";

    let live = LiveFacts::new(platforms(false));
    let before = OperationalSnapshot::railway(live.snapshot().unwrap(), at);

    let generation = thread::scope(|s| {
        s.spawn(|| live.replace(platforms(true)).unwrap())
            .join()
            .unwrap()
    });
    assert_eq!(generation, live.generation().unwrap());

    let after = OperationalSnapshot::railway(live.snapshot().unwrap(), at);

    let old = engine
        .evaluate(text, &before, &catalog, &RuleSet::empty(), &[])
        .unwrap();
    let new = engine
        .evaluate(text, &after, &catalog, &RuleSet::empty(), &[])
        .unwrap();
    assert!(old.is_feasible());
    assert_eq!(new.reason_messages(), vec!["platform is occupied"]);
}
