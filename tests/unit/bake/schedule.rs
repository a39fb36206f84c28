use super::*;

#[test]
fn newer_tickets_supersede_older_ones() {
    let mut g = GenerationCounter::default();
    let a1 = g.issue(MeshId(0));
    let b1 = g.issue(MeshId(1));
    let a2 = g.issue(MeshId(0));

    assert!(!g.is_current(a1));
    assert!(g.is_current(a2));
    assert!(g.is_current(b1));
    assert!(a2.generation > a1.generation);

    g.reset();
    assert!(!g.is_current(a2));
    assert!(!g.is_current(b1));
}

#[test]
fn tickets_from_before_a_reset_never_match_later_ones() {
    let mut g = GenerationCounter::default();
    let before = g.issue(MeshId(0));
    g.reset();
    let after = g.issue(MeshId(0));

    assert_ne!(before, after);
    assert!(!g.is_current(before));
    assert!(g.is_current(after));
}

#[test]
fn debounce_fires_on_trailing_edge() {
    let t0 = Instant::now();
    let mut d = Debouncer::new(Duration::from_millis(100));
    assert!(!d.take_ready_at(t0));

    d.notify_at(t0);
    d.notify_at(t0 + Duration::from_millis(60));
    assert!(d.is_pending());
    // 100ms after the first change but only 40ms after the last one.
    assert!(!d.take_ready_at(t0 + Duration::from_millis(100)));
    assert!(d.take_ready_at(t0 + Duration::from_millis(160)));
    assert!(!d.is_pending());
    assert!(!d.take_ready_at(t0 + Duration::from_millis(500)));
}

#[test]
fn zero_window_fires_immediately_and_take_now_flushes() {
    let t0 = Instant::now();
    let mut d = Debouncer::new(Duration::ZERO);
    d.notify_at(t0);
    assert!(d.take_ready_at(t0));

    let mut d = Debouncer::new(Duration::from_secs(60));
    d.notify_at(t0);
    assert!(d.take_now());
    assert!(!d.take_now());
}
