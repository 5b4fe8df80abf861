// Native integration tests for the mole engine. The scheduler runs on a
// logical clock driven by `tick`, and the index picker is injected, so every
// temporal scenario here is deterministic with no wall-clock waits.

use mole_keys::{
    ANIMALS, Animal, Command, EngineConfig, MoleEngine, RESPAWN_DEBOUNCE_MS, WRONG_KEY_DISPLAY_MS,
};

fn engine(config: EngineConfig) -> MoleEngine {
    // Picker always takes the first available entry (alphabetical order).
    MoleEngine::new(&ANIMALS, config, Box::new(|_| 0))
}

fn cues(eng: &mut MoleEngine) -> Vec<String> {
    eng.drain_commands()
        .into_iter()
        .map(|c| match c {
            Command::PlayCue { text } => text,
        })
        .collect()
}

fn single_animal_catalog() -> &'static [Animal] {
    Box::leak(
        vec![Animal {
            letter: 'A',
            name: "蚂蚁",
            name_en: "Ant",
            emoji: "🐜",
            sound: "吱吱",
        }]
        .into_boxed_slice(),
    )
}

#[test]
fn single_target_mode_never_exceeds_one_active() {
    let mut eng = engine(EngineConfig::classic());
    eng.start(0.0);
    assert_eq!(eng.snapshot().targets.len(), 1);
    for _ in 0..10 {
        eng.spawn();
        assert!(eng.snapshot().targets.len() <= 1);
    }
}

#[test]
fn multi_target_mode_bounded_with_unique_letters() {
    let mut config = EngineConfig::frenzy();
    config.max_concurrent_targets = 3;
    let mut eng = engine(config);
    eng.start(0.0);
    let snap = eng.snapshot();
    assert_eq!(snap.targets.len(), 3);
    let letters: Vec<char> = snap.targets.iter().map(|t| t.letter).collect();
    let mut dedup = letters.clone();
    dedup.sort_unstable();
    dedup.dedup();
    assert_eq!(dedup.len(), letters.len(), "duplicate letters co-occur");
    assert!(!eng.spawn(), "spawn past the bound must be a no-op");
}

#[test]
fn catalog_exhaustion_makes_spawn_a_noop() {
    let mut config = EngineConfig::frenzy();
    config.max_concurrent_targets = 26;
    let mut eng = engine(config);
    eng.start(0.0);
    assert_eq!(eng.snapshot().targets.len(), 26);
    assert!(!eng.spawn());
    // Destroying one target frees its letter again.
    let letter = eng.snapshot().targets[0].letter;
    eng.resolve_key(letter);
    assert_eq!(eng.snapshot().targets.len(), 25);
    assert!(eng.spawn());
}

#[test]
fn correct_press_scores_and_schedules_respawn_at_debounce() {
    let mut eng = MoleEngine::new(
        single_animal_catalog(),
        EngineConfig::classic(),
        Box::new(|_| 0),
    );
    eng.start(0.0);
    assert_eq!(cues(&mut eng), vec!["蚂蚁".to_string()]);

    eng.tick(100.0);
    let snap = eng.resolve_key('A');
    assert_eq!(snap.score, 1);
    assert!(snap.targets.is_empty());

    // Just before the debounce elapses nothing has respawned.
    eng.tick(100.0 + RESPAWN_DEBOUNCE_MS - 1.0);
    assert!(eng.snapshot().targets.is_empty());
    // At exactly +500ms the slot refills (exclude set is empty again).
    eng.tick(100.0 + RESPAWN_DEBOUNCE_MS);
    let snap = eng.snapshot();
    assert_eq!(snap.targets.len(), 1);
    assert_eq!(snap.targets[0].letter, 'A');
}

#[test]
fn score_counts_exactly_the_correct_presses() {
    let mut eng = engine(EngineConfig::classic());
    eng.start(0.0);
    let mut now = 0.0;
    let mut correct = 0;
    for round in 0..5 {
        let letter = eng.snapshot().targets[0].letter;
        // Interleave misses and junk input; neither may affect the score.
        eng.resolve_key('0');
        eng.resolve_key(if letter == 'Z' { 'Y' } else { 'Z' });
        eng.resolve_key(letter);
        correct += 1;
        assert_eq!(eng.snapshot().score, correct);
        now += RESPAWN_DEBOUNCE_MS + (round as f64);
        eng.tick(now);
    }
    assert_eq!(eng.snapshot().score, 5);
}

#[test]
fn stale_expiry_never_fires_after_a_correct_press() {
    let mut eng = engine(EngineConfig::countdown());
    eng.start(0.0);
    let letter = eng.snapshot().targets[0].letter;
    eng.tick(1_000.0);
    eng.resolve_key(letter);
    assert_eq!(eng.snapshot().score, 1);
    // Let the debounce fire: the replacement arrives at 1500 with a fresh
    // 10s deadline.
    eng.tick(1_500.0);
    assert_eq!(eng.snapshot().targets.len(), 1);

    // Crossing the original target's 10s deadline must not disturb it.
    eng.tick(10_500.0);
    let snap = eng.snapshot();
    assert_eq!(snap.score, 1);
    assert_eq!(snap.targets.len(), 1);
    let remaining = snap.targets[0].remaining_ms.unwrap();
    assert!((remaining - 1_000.0).abs() < 1e-6, "remaining {remaining}");
}

#[test]
fn unpressed_target_expires_and_auto_advances() {
    let mut eng = engine(EngineConfig::countdown());
    eng.start(0.0);
    let first = eng.snapshot().targets[0].clone();
    assert_eq!(first.activated_at, 0.0);

    eng.tick(9_999.0);
    assert_eq!(eng.snapshot().targets[0].activated_at, 0.0);
    eng.tick(10_000.0);
    let snap = eng.snapshot();
    assert_eq!(snap.targets.len(), 1, "auto-advance must replace the target");
    assert_eq!(snap.targets[0].activated_at, 10_000.0);
    assert_eq!(snap.targets[0].remaining_ms, Some(10_000.0));
    assert_eq!(snap.score, 0);
}

#[test]
fn wrong_key_feedback_shows_and_clears_after_display_window() {
    let mut eng = engine(EngineConfig::classic());
    eng.start(0.0);
    let correct = eng.snapshot().targets[0].letter;
    let wrong = if correct == 'X' { 'W' } else { 'X' };

    eng.tick(100.0);
    cues(&mut eng);
    let snap = eng.resolve_key(wrong);
    assert_eq!(snap.wrong_key, Some(wrong));
    assert_eq!(snap.score, 0);
    assert_eq!(cues(&mut eng), vec![format!("按错了哦，要按{correct}")]);

    eng.tick(100.0 + WRONG_KEY_DISPLAY_MS - 1.0);
    assert_eq!(eng.snapshot().wrong_key, Some(wrong));
    eng.tick(100.0 + WRONG_KEY_DISPLAY_MS);
    assert_eq!(eng.snapshot().wrong_key, None);
}

#[test]
fn newer_wrong_key_supersedes_pending_clear() {
    let mut eng = engine(EngineConfig::classic());
    eng.start(0.0);
    let correct = eng.snapshot().targets[0].letter;
    let picks: Vec<char> = ['X', 'Y', 'W'].into_iter().filter(|c| *c != correct).collect();

    eng.tick(100.0);
    eng.resolve_key(picks[0]);
    eng.tick(1_000.0);
    eng.resolve_key(picks[1]);

    // The first clear deadline passes without effect; the second one holds.
    eng.tick(2_100.0);
    assert_eq!(eng.snapshot().wrong_key, Some(picks[1]));
    eng.tick(3_000.0);
    assert_eq!(eng.snapshot().wrong_key, None);
}

#[test]
fn multi_target_mode_ignores_misses_silently() {
    let mut config = EngineConfig::frenzy();
    config.max_concurrent_targets = 3;
    let mut eng = engine(config);
    eng.start(0.0);
    cues(&mut eng);

    let active: Vec<char> = eng.snapshot().targets.iter().map(|t| t.letter).collect();
    let miss = ('A'..='Z').find(|c| !active.contains(c)).unwrap();
    let snap = eng.resolve_key(miss);
    assert_eq!(snap.wrong_key, None);
    assert_eq!(snap.score, 0);
    assert!(cues(&mut eng).is_empty());
}

#[test]
fn pause_freezes_remaining_lifetime_exactly() {
    let mut eng = engine(EngineConfig::countdown());
    eng.start(0.0);
    eng.tick(4_000.0);
    eng.toggle_pause();

    // Wall clock keeps advancing while paused; nothing may expire.
    eng.tick(9_000.0);
    let snap = eng.snapshot();
    assert!(snap.paused);
    assert_eq!(snap.targets.len(), 1);
    assert_eq!(snap.targets[0].remaining_ms, Some(6_000.0));

    eng.toggle_pause();
    assert_eq!(eng.snapshot().targets[0].remaining_ms, Some(6_000.0));

    // Deadline is re-anchored: 9000 + 6000 = 15000, not the original 10000.
    eng.tick(14_999.0);
    assert_eq!(eng.snapshot().targets[0].activated_at, 0.0);
    eng.tick(15_000.0);
    assert_eq!(eng.snapshot().targets[0].activated_at, 15_000.0);
}

#[test]
fn pause_blocks_input_and_spawns() {
    let mut eng = engine(EngineConfig::classic());
    eng.start(0.0);
    let letter = eng.snapshot().targets[0].letter;
    eng.toggle_pause();

    let snap = eng.resolve_key(letter);
    assert_eq!(snap.score, 0);
    assert_eq!(snap.targets.len(), 1);
    assert!(!eng.spawn());
}

#[test]
fn pause_suspends_hint_repeat_and_resume_replays_once() {
    let mut eng = MoleEngine::new(
        single_animal_catalog(),
        EngineConfig::classic(),
        Box::new(|_| 0),
    );
    eng.start(0.0);
    assert_eq!(cues(&mut eng), vec!["蚂蚁".to_string()]);

    // Steady 3s repeat while running.
    eng.tick(3_000.0);
    assert_eq!(cues(&mut eng), vec!["蚂蚁".to_string()]);

    // Pause 1s into the next interval; no cue fires while paused.
    eng.tick(4_000.0);
    eng.toggle_pause();
    eng.tick(20_000.0);
    assert!(cues(&mut eng).is_empty());

    // Resume replays the hint immediately, then continues with the 2s that
    // were left of the interval, then the steady period again.
    eng.toggle_pause();
    assert_eq!(cues(&mut eng), vec!["蚂蚁".to_string()]);
    eng.tick(21_999.0);
    assert!(cues(&mut eng).is_empty());
    eng.tick(22_000.0);
    assert_eq!(cues(&mut eng), vec!["蚂蚁".to_string()]);
    eng.tick(25_000.0);
    assert_eq!(cues(&mut eng), vec!["蚂蚁".to_string()]);
}

#[test]
fn pause_suspends_respawn_debounce() {
    let mut eng = MoleEngine::new(
        single_animal_catalog(),
        EngineConfig::classic(),
        Box::new(|_| 0),
    );
    eng.start(0.0);
    eng.resolve_key('A');
    eng.tick(200.0);
    eng.toggle_pause();

    // Debounce had 300ms left; the deadline must not fire during the pause.
    eng.tick(5_000.0);
    assert!(eng.snapshot().targets.is_empty());
    eng.toggle_pause();
    eng.tick(5_299.0);
    assert!(eng.snapshot().targets.is_empty());
    eng.tick(5_300.0);
    assert_eq!(eng.snapshot().targets.len(), 1);
}

#[test]
fn correct_press_emits_correct_cue_and_clears_wrong_indicator() {
    let mut eng = engine(EngineConfig::classic());
    eng.start(0.0);
    let correct = eng.snapshot().targets[0].letter;
    let wrong = if correct == 'Q' { 'P' } else { 'Q' };

    eng.tick(100.0);
    eng.resolve_key(wrong);
    assert!(eng.snapshot().wrong_key.is_some());
    cues(&mut eng);

    let snap = eng.resolve_key(correct);
    assert_eq!(snap.wrong_key, None);
    assert_eq!(cues(&mut eng), vec![mole_keys::CORRECT_CUE.to_string()]);
}

#[test]
fn hint_mirrors_sole_target_in_single_target_mode() {
    let mut eng = engine(EngineConfig::classic());
    eng.start(0.0);
    let snap = eng.snapshot();
    assert_eq!(snap.hint.as_ref().map(|h| h.letter), Some(snap.targets[0].letter));

    let mut config = EngineConfig::frenzy();
    config.max_concurrent_targets = 2;
    let mut multi = engine(config);
    multi.start(0.0);
    assert!(multi.snapshot().hint.is_none());
}
