// Playback sessions over generated timelines, on a paused tokio clock for determinism

use std::time::Duration;

use readsync::config::{ClockMode, EstimatorConfig, GenerationConfig, PlaybackConfig};
use readsync::timing::build_timeline;
use readsync::tracker::{AudioSource, ClockKind, PlaybackSession, SimulatedDevice};
use readsync::{CurrentPosition, PlaybackState, ReadingTimeline, TimingSource};

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::{paced_alignment, STORY};

fn estimated_story() -> ReadingTimeline {
    build_timeline(STORY, &TimingSource::Estimated(EstimatorConfig::default()), &GenerationConfig::default())
}

fn source() -> AudioSource {
    AudioSource::Uri("memory://fox".into())
}

/// Play to the end, collecting every position change
async fn highlighted_words(timeline: &ReadingTimeline, device: SimulatedDevice, config: PlaybackConfig) -> Vec<CurrentPosition> {
    let mut session = PlaybackSession::new(device, timeline, config);
    session.load(&source()).await.unwrap();
    session.play().await.unwrap();

    let mut seen = Vec::new();
    let state = session
        .run_until_stopped(|update| {
            if let (true, Some(position)) = (update.changed, update.position) {
                seen.push(position);
            }
        })
        .await
        .unwrap();
    assert_eq!(state, PlaybackState::Finished);
    session.close().await.unwrap();
    seen
}

#[tokio::test(start_paused = true)]
async fn test_polling_highlights_every_word_in_order() {
    let timeline = estimated_story();
    let device = SimulatedDevice::new(timeline.total_duration, 1.0);
    let seen = highlighted_words(&timeline, device, PlaybackConfig::default()).await;

    let expected: Vec<CurrentPosition> = timeline.word_timeline.iter().map(|e| e.position()).collect();
    assert_eq!(seen, expected, "every estimated word lasts longer than one 50ms tick");
}

#[tokio::test(start_paused = true)]
async fn test_callbacks_and_polling_agree() {
    let timeline = build_timeline(
        STORY,
        &TimingSource::Alignment(paced_alignment(STORY)),
        &GenerationConfig::default(),
    );

    let polled = highlighted_words(
        &timeline,
        SimulatedDevice::new(timeline.total_duration, 1.0),
        PlaybackConfig { clock_mode: ClockMode::Polling, poll_interval_ms: 10, ..Default::default() },
    )
    .await;
    let pushed = highlighted_words(
        &timeline,
        SimulatedDevice::new(timeline.total_duration, 1.0).with_callbacks(Duration::from_millis(10)),
        PlaybackConfig { clock_mode: ClockMode::Callbacks, poll_interval_ms: 10, ..Default::default() },
    )
    .await;

    assert!(!polled.is_empty());
    assert_eq!(polled, pushed);
    for pair in polled.windows(2) {
        assert!(
            (pair[0].paragraph_index, pair[0].sentence_index, pair[0].word_index)
                < (pair[1].paragraph_index, pair[1].sentence_index, pair[1].word_index),
            "highlight moved backwards: {:?}",
            pair
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_updates_and_resume_continues() {
    let timeline = estimated_story();
    let mut session = PlaybackSession::new(
        SimulatedDevice::new(timeline.total_duration, 1.0),
        &timeline,
        PlaybackConfig::default(),
    );
    session.load(&source()).await.unwrap();
    assert_eq!(session.clock_kind(), Some(ClockKind::Polling));
    session.play().await.unwrap();

    let mut last = None;
    while last.map_or(true, |u: readsync::PositionUpdate| u.elapsed_ms < 1000) {
        last = session.next_update().await.unwrap();
    }
    session.pause().await.unwrap();
    assert_eq!(session.state(), PlaybackState::ReadyPaused);
    let paused_at = session.tracker().elapsed_ms();

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(session.next_update().await.unwrap().is_none(), "paused sessions do not poll");
    assert_eq!(session.tracker().elapsed_ms(), paused_at);

    session.play().await.unwrap();
    let resumed = session.next_update().await.unwrap().unwrap();
    assert!(resumed.elapsed_ms >= paused_at && resumed.elapsed_ms < paused_at + 100);
    session.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_skip_moves_highlight_between_sentences() {
    let timeline = estimated_story();
    let mut session = PlaybackSession::new(
        SimulatedDevice::new(timeline.total_duration, 1.0),
        &timeline,
        PlaybackConfig::default(),
    );
    let watcher = session.subscribe();
    session.load(&source()).await.unwrap();

    let target = session.skip_forward(Some(5)).await.unwrap();
    assert_eq!(target, 5000);
    let published = watcher.borrow().expect("seek publishes immediately when polling");
    assert_eq!(published.elapsed_ms, 5000);
    assert_eq!(published.position, readsync::TimelineIndex::from_timeline(&timeline).locate(5000));

    let back = session.skip_backward(Some(2)).await.unwrap();
    assert_eq!(back, 3000);
    assert_eq!(session.seek(u64::MAX).await.unwrap(), timeline.total_duration);
}

#[tokio::test]
async fn test_failed_load_can_be_retried() {
    let timeline = estimated_story();
    let device = SimulatedDevice::new(timeline.total_duration, 1.0).failing_loads(2);
    let mut session = PlaybackSession::new(device, &timeline, PlaybackConfig::default());

    for _ in 0..2 {
        assert!(session.load(&source()).await.is_err());
        assert_eq!(session.state(), PlaybackState::Idle);
    }
    session.load(&source()).await.unwrap();
    assert_eq!(session.state(), PlaybackState::ReadyPaused);
}
