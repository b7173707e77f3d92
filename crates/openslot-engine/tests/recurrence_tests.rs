//! Tests for recurrence validation and expansion.

use chrono::{DateTime, Duration, TimeZone, Utc, Weekday};
use uuid::Uuid;

use openslot_engine::recurrence::{
    expand, expand_time_blocks, Cadence, Frequency, RecurrencePattern,
};
use openslot_engine::EngineError;
use openslot_store::TimeBlockKind;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn dt(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// Fixed "now" anchor used by the past-date checks.
fn now() -> DateTime<Utc> {
    dt("2025-01-01T00:00:00Z")
}

fn fields(err: EngineError) -> Vec<String> {
    match err {
        EngineError::Validation { errors, .. } => {
            errors.into_iter().map(|e| e.field).collect()
        }
        other => panic!("expected a validation error, got: {other}"),
    }
}

fn messages(err: EngineError) -> Vec<String> {
    match err {
        EngineError::Validation { errors, .. } => {
            errors.into_iter().map(|e| e.message).collect()
        }
        other => panic!("expected a validation error, got: {other}"),
    }
}

// ── Validation ──────────────────────────────────────────────────────────────

#[test]
fn zero_interval_is_rejected() {
    let err = RecurrencePattern::daily(0)
        .count(3)
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap_err();
    assert!(fields(err).contains(&"interval".to_string()));
}

#[test]
fn both_terminations_are_rejected() {
    let err = RecurrencePattern::daily(1)
        .count(3)
        .until(dt("2025-06-01T00:00:00Z"))
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap_err();
    assert!(messages(err).iter().any(|m| m.contains("both")));
}

#[test]
fn missing_termination_is_rejected() {
    let err = RecurrencePattern::daily(1)
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap_err();
    assert!(messages(err).iter().any(|m| m.contains("required to terminate")));
}

#[test]
fn past_end_date_is_rejected() {
    let err = RecurrencePattern::daily(1)
        .until(dt("2025-01-31T00:00:00Z"))
        .validate(dt("2025-06-06T09:00:00Z"), dt("2025-06-01T00:00:00Z"))
        .unwrap_err();
    assert!(messages(err).iter().any(|m| m.contains("past")));
}

#[test]
fn zero_max_occurrences_is_rejected() {
    let err = RecurrencePattern::daily(1)
        .count(0)
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap_err();
    assert!(fields(err).contains(&"maxOccurrences".to_string()));
}

#[test]
fn daily_rejects_day_selectors() {
    let mut pattern = RecurrencePattern::daily(1).count(3);
    pattern.days_of_week = Some(vec![1, 3]);
    pattern.days_of_month = Some(vec![15]);

    let err = pattern.validate(dt("2025-01-06T09:00:00Z"), now()).unwrap_err();
    let fields = fields(err);
    assert!(fields.contains(&"daysOfWeek".to_string()));
    assert!(fields.contains(&"daysOfMonth".to_string()));
}

#[test]
fn weekly_rejects_days_of_month() {
    let mut pattern = RecurrencePattern::weekly(1, vec![1]).count(3);
    pattern.days_of_month = Some(vec![15]);

    let err = pattern.validate(dt("2025-01-06T09:00:00Z"), now()).unwrap_err();
    assert!(fields(err).contains(&"daysOfMonth".to_string()));
}

#[test]
fn weekly_rejects_out_of_range_days() {
    let err = RecurrencePattern::weekly(1, vec![1, 7])
        .count(3)
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap_err();
    assert!(messages(err).iter().any(|m| m.contains("0 (Sunday) and 6 (Saturday)")));
}

#[test]
fn weekly_rejects_duplicate_days() {
    let err = RecurrencePattern::weekly(1, vec![1, 3, 1])
        .count(3)
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap_err();
    assert!(messages(err).iter().any(|m| m.contains("duplicate")));
}

#[test]
fn weekly_requires_the_base_day_in_the_selection() {
    // Base occurrence on a Monday, selection covers only Tuesday.
    let base = dt("2025-01-06T09:00:00Z");
    assert_eq!(base.format("%a").to_string(), "Mon");

    let err = RecurrencePattern::weekly(1, vec![2])
        .count(3)
        .validate(base, now())
        .unwrap_err();
    assert!(
        messages(err).iter().any(|m| m.contains("Mon")),
        "error should name the mismatched day"
    );
}

#[test]
fn weekly_without_days_defaults_to_the_base_day() {
    let pattern = RecurrencePattern {
        frequency: Frequency::Weekly,
        interval: 1,
        days_of_week: None,
        days_of_month: None,
        end_date: None,
        max_occurrences: Some(4),
    };

    let recurrence = pattern.validate(dt("2025-01-06T09:00:00Z"), now()).unwrap();
    assert_eq!(
        recurrence.cadence,
        Cadence::Weekly {
            days: vec![Weekday::Mon]
        }
    );
}

#[test]
fn monthly_rejects_days_of_week() {
    let mut pattern = RecurrencePattern::monthly(1, vec![15]).count(3);
    pattern.days_of_week = Some(vec![1]);

    let err = pattern.validate(dt("2025-01-15T09:00:00Z"), now()).unwrap_err();
    assert!(fields(err).contains(&"daysOfWeek".to_string()));
}

#[test]
fn monthly_rejects_zero_and_out_of_range_days() {
    for day in [0, 32, -32] {
        let err = RecurrencePattern::monthly(1, vec![day])
            .count(3)
            .validate(dt("2025-01-15T09:00:00Z"), now())
            .unwrap_err();
        assert!(
            messages(err).iter().any(|m| m.contains("between -31 and -1")),
            "day {day} should hit the range rule"
        );
    }
}

#[test]
fn monthly_rejects_negatives_other_than_the_last_three_days() {
    // Only -1, -2, and -3 are meaningful; everything else in the negative
    // range is refused even though it would be representable.
    for day in [-4, -15, -30] {
        let err = RecurrencePattern::monthly(1, vec![day, 15])
            .count(3)
            .validate(dt("2025-01-15T09:00:00Z"), now())
            .unwrap_err();
        assert!(
            messages(err).iter().any(|m| m.contains("is invalid")),
            "day {day} should hit the special-value rule"
        );
    }

    for day in [-1, -2, -3] {
        RecurrencePattern::monthly(1, vec![day, 15])
            .count(3)
            .validate(dt("2025-01-15T09:00:00Z"), now())
            .unwrap_or_else(|err| panic!("day {day} should be accepted: {err}"));
    }
}

#[test]
fn monthly_requires_the_base_day_in_the_selection() {
    let err = RecurrencePattern::monthly(1, vec![20])
        .count(3)
        .validate(dt("2025-01-15T09:00:00Z"), now())
        .unwrap_err();
    assert!(messages(err).iter().any(|m| m.contains("day 15")));
}

#[test]
fn monthly_last_day_alias_covers_a_base_on_the_last_day() {
    // 2025-01-31 is the last day of its month, so [-1] covers it.
    RecurrencePattern::monthly(1, vec![-1])
        .until(dt("2025-04-01T00:00:00Z"))
        .validate(dt("2025-01-31T09:00:00Z"), now())
        .unwrap();
}

#[test]
fn monthly_without_days_defaults_to_the_base_day() {
    let pattern = RecurrencePattern {
        frequency: Frequency::Monthly,
        interval: 1,
        days_of_week: None,
        days_of_month: None,
        end_date: None,
        max_occurrences: Some(4),
    };

    let recurrence = pattern.validate(dt("2025-01-15T09:00:00Z"), now()).unwrap();
    assert_eq!(recurrence.cadence, Cadence::Monthly { days: vec![15] });
}

#[test]
fn all_violations_are_reported_together() {
    let mut pattern = RecurrencePattern::daily(0);
    pattern.days_of_week = Some(vec![1]);

    let err = pattern.validate(dt("2025-01-06T09:00:00Z"), now()).unwrap_err();
    // interval, termination, and the stray selector, all in one response.
    assert_eq!(fields(err).len(), 3);
}

// ── Daily expansion ─────────────────────────────────────────────────────────

#[test]
fn daily_count_three_generates_two_additional_occurrences() {
    let recurrence = RecurrencePattern::daily(1)
        .count(3)
        .validate(dt("2025-01-01T09:00:00Z"), now())
        .unwrap();

    let occurrences = expand(
        &recurrence,
        dt("2025-01-01T09:00:00Z"),
        dt("2025-01-01T10:00:00Z"),
    );

    assert_eq!(occurrences.len(), 2);
    assert_eq!(occurrences[0].start, dt("2025-01-02T09:00:00Z"));
    assert_eq!(occurrences[0].end, dt("2025-01-02T10:00:00Z"));
    assert_eq!(occurrences[1].start, dt("2025-01-03T09:00:00Z"));
    assert_eq!(occurrences[1].end, dt("2025-01-03T10:00:00Z"));
}

#[test]
fn daily_interval_skips_days() {
    let recurrence = RecurrencePattern::daily(3)
        .until(dt("2025-01-10T23:59:59Z"))
        .validate(dt("2025-01-01T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-01T09:00:00Z"),
        dt("2025-01-01T09:30:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(
        starts,
        vec![
            dt("2025-01-04T09:00:00Z"),
            dt("2025-01-07T09:00:00Z"),
            dt("2025-01-10T09:00:00Z"),
        ]
    );
}

#[test]
fn count_of_one_generates_nothing_beyond_the_base() {
    let recurrence = RecurrencePattern::daily(1)
        .count(1)
        .validate(dt("2025-01-01T09:00:00Z"), now())
        .unwrap();

    assert!(expand(
        &recurrence,
        dt("2025-01-01T09:00:00Z"),
        dt("2025-01-01T10:00:00Z")
    )
    .is_empty());
}

#[test]
fn count_terminated_patterns_stop_at_the_two_year_horizon() {
    // 100 occurrences requested, but every 90 days only 8 fit in 2 years.
    let recurrence = RecurrencePattern::daily(90)
        .count(100)
        .validate(dt("2025-01-01T09:00:00Z"), now())
        .unwrap();

    let occurrences = expand(
        &recurrence,
        dt("2025-01-01T09:00:00Z"),
        dt("2025-01-01T10:00:00Z"),
    );
    assert_eq!(occurrences.len(), 8);
}

// ── Weekly expansion ────────────────────────────────────────────────────────

#[test]
fn weekly_emits_selected_days_after_the_base_in_its_own_week() {
    // Base on Monday 2025-01-06; Mon/Wed/Fri selected.
    let recurrence = RecurrencePattern::weekly(1, vec![1, 3, 5])
        .until(dt("2025-01-17T23:59:59Z"))
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-06T09:00:00Z"),
        dt("2025-01-06T10:00:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(
        starts,
        vec![
            dt("2025-01-08T09:00:00Z"), // Wed, base week
            dt("2025-01-10T09:00:00Z"), // Fri, base week
            dt("2025-01-13T09:00:00Z"), // Mon, next week
            dt("2025-01-15T09:00:00Z"), // Wed, next week
            dt("2025-01-17T09:00:00Z"), // Fri, next week
        ]
    );
}

#[test]
fn weekly_base_week_excludes_days_at_or_before_the_base_day() {
    // Base on Wednesday 2025-01-08. Within the base week only Friday is
    // generated; Monday and Wednesday belong to the base occurrence.
    let recurrence = RecurrencePattern::weekly(1, vec![1, 3, 5])
        .until(dt("2025-01-11T23:59:59Z"))
        .validate(dt("2025-01-08T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-08T09:00:00Z"),
        dt("2025-01-08T10:00:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(starts, vec![dt("2025-01-10T09:00:00Z")]);
}

#[test]
fn weekly_interval_two_visits_every_other_week() {
    let recurrence = RecurrencePattern::weekly(2, vec![1])
        .until(dt("2025-02-03T23:59:59Z"))
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-06T09:00:00Z"),
        dt("2025-01-06T10:00:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(
        starts,
        vec![dt("2025-01-13T09:00:00Z"), dt("2025-01-27T09:00:00Z")]
    );
}

#[test]
fn weekly_occurrence_budget_stops_generation_mid_week() {
    // Every weekday selected, 3 occurrences total: the base plus two.
    let recurrence = RecurrencePattern::weekly(1, vec![1, 2, 3, 4, 5])
        .count(3)
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-06T09:00:00Z"),
        dt("2025-01-06T10:00:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(
        starts,
        vec![dt("2025-01-07T09:00:00Z"), dt("2025-01-08T09:00:00Z")]
    );
}

#[test]
fn weekly_output_is_sorted_regardless_of_selector_order() {
    let recurrence = RecurrencePattern::weekly(1, vec![5, 1, 3])
        .until(dt("2025-01-17T23:59:59Z"))
        .validate(dt("2025-01-06T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-06T09:00:00Z"),
        dt("2025-01-06T10:00:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

// ── Monthly expansion ───────────────────────────────────────────────────────

#[test]
fn monthly_last_day_tracks_each_months_length() {
    let recurrence = RecurrencePattern::monthly(1, vec![-1])
        .until(dt("2025-04-01T00:00:00Z"))
        .validate(dt("2025-01-31T09:00:00Z"), now())
        .unwrap();

    let occurrences = expand(
        &recurrence,
        dt("2025-01-31T09:00:00Z"),
        dt("2025-01-31T10:00:00Z"),
    );

    // The base (Jan 31) is not re-emitted; February and March contribute
    // their own last days.
    let starts: Vec<_> = occurrences.iter().map(|r| r.start).collect();
    assert_eq!(
        starts,
        vec![dt("2025-02-28T09:00:00Z"), dt("2025-03-31T09:00:00Z")]
    );
    for occurrence in &occurrences {
        assert_eq!(occurrence.duration(), Duration::hours(1));
    }
}

#[test]
fn monthly_positive_days_clamp_to_short_months() {
    let recurrence = RecurrencePattern::monthly(1, vec![31])
        .until(dt("2025-04-30T23:59:59Z"))
        .validate(dt("2025-01-31T10:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-31T10:00:00Z"),
        dt("2025-01-31T11:00:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(
        starts,
        vec![
            dt("2025-02-28T10:00:00Z"),
            dt("2025-03-31T10:00:00Z"),
            dt("2025-04-30T10:00:00Z"),
        ]
    );
}

#[test]
fn monthly_multiple_selectors_interleave_sorted() {
    let recurrence = RecurrencePattern::monthly(1, vec![15, -1])
        .until(dt("2025-03-20T00:00:00Z"))
        .validate(dt("2025-01-15T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-15T09:00:00Z"),
        dt("2025-01-15T10:30:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(
        starts,
        vec![
            dt("2025-01-31T09:00:00Z"),
            dt("2025-02-15T09:00:00Z"),
            dt("2025-02-28T09:00:00Z"),
            dt("2025-03-15T09:00:00Z"),
        ]
    );
}

#[test]
fn monthly_occurrence_budget_counts_the_base() {
    let recurrence = RecurrencePattern::monthly(1, vec![15, -1])
        .count(3)
        .validate(dt("2025-01-15T09:00:00Z"), now())
        .unwrap();

    let starts: Vec<_> = expand(
        &recurrence,
        dt("2025-01-15T09:00:00Z"),
        dt("2025-01-15T10:00:00Z"),
    )
    .into_iter()
    .map(|r| r.start)
    .collect();

    assert_eq!(
        starts,
        vec![dt("2025-01-31T09:00:00Z"), dt("2025-02-15T09:00:00Z")]
    );
}

// ── Materialization ─────────────────────────────────────────────────────────

#[test]
fn expanded_blocks_share_the_recurrence_group_and_metadata() {
    let recurrence = RecurrencePattern::daily(1)
        .count(4)
        .validate(dt("2025-01-01T09:00:00Z"), now())
        .unwrap();

    let master_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();
    let blocks = expand_time_blocks(
        &recurrence,
        dt("2025-01-01T09:00:00Z"),
        dt("2025-01-01T10:00:00Z"),
        master_id,
        tenant_id,
        TimeBlockKind::Break,
        Some("lunch"),
        now(),
    );

    assert_eq!(blocks.len(), 3);
    for block in &blocks {
        assert_eq!(block.tenant_id, tenant_id);
        assert_eq!(block.recurrence_id, Some(master_id));
        assert_eq!(block.kind, TimeBlockKind::Break);
        assert_eq!(block.reason.as_deref(), Some("lunch"));
        assert_eq!(block.end - block.start, Duration::hours(1));
    }
    // Fresh identity per occurrence.
    assert_ne!(blocks[0].id, blocks[1].id);
}
