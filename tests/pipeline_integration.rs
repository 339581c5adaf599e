// End-to-end: story text → timeline document on disk → index at read time

use readsync::config::{EstimatorConfig, GenerationConfig, DEFAULT_NARRATION_VOICE_ID};
use readsync::timing::{build_timeline, NarrationResponse};
use readsync::{ReadingTimeline, TimelineIndex, TimingSource};

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::{paced_alignment, TestFixture, STORY};

#[tokio::test]
async fn test_generated_timeline_survives_disk_round_trip() {
    let fixture = TestFixture::new();
    let path = fixture.root_path.join("assets/readings/fox.json");

    let timeline = build_timeline(
        STORY,
        &TimingSource::Alignment(paced_alignment(STORY)),
        &GenerationConfig::default(),
    );
    timeline.save(&path).await.expect("Failed to save timeline");
    assert!(path.exists(), "save should create parent directories");

    let loaded = ReadingTimeline::load(&path).await.expect("Failed to load timeline");
    assert_eq!(loaded, timeline);
    assert_eq!(loaded.title, "The Fox and the River");
    assert_eq!(loaded.metadata.voice_id, DEFAULT_NARRATION_VOICE_ID);
    assert_eq!(loaded.metadata.word_count, loaded.word_timeline.len());
}

#[tokio::test]
async fn test_written_json_matches_reader_contract() {
    let fixture = TestFixture::new();
    let path = fixture.root_path.join("story.json");
    let config = GenerationConfig { voice_id: Some("narrator-1".into()), ..Default::default() };
    build_timeline("Hi there.", &TimingSource::Estimated(EstimatorConfig::default()), &config)
        .save(&path)
        .await
        .unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["totalDuration"], raw["wordTimeline"][1]["endTime"]);
    assert_eq!(raw["metadata"]["voiceId"], "narrator-1");
    assert_eq!(raw["metadata"]["sentenceCount"], 1);
    assert_eq!(raw["paragraphs"][0]["sentences"][0]["words"][1]["text"], "there.");
}

#[tokio::test]
async fn test_load_reports_missing_and_malformed_files() {
    let fixture = TestFixture::new();
    let missing = ReadingTimeline::load(&fixture.root_path.join("nope.json")).await;
    assert!(missing.is_err());

    let broken = fixture.create_file("broken.json", "{\"title\": 1}");
    let error = ReadingTimeline::load(&broken).await.unwrap_err();
    assert!(format!("{error:#}").contains("Invalid timeline document"));
}

#[test]
fn test_narration_response_drives_exact_timing() {
    let alignment = paced_alignment("Hello there, friend.");
    let response_json = serde_json::json!({
        "audio_base64": "SUQz",
        "alignment": alignment,
    })
    .to_string();
    let response: NarrationResponse = serde_json::from_str(&response_json).unwrap();

    let timeline = build_timeline(
        "Hello there, friend.",
        &TimingSource::Alignment(response.best_alignment().clone()),
        &GenerationConfig::default(),
    );
    let index = TimelineIndex::from_timeline(&timeline);

    // "there," absorbs its comma: 5 letters × 70ms + 120ms
    let there = timeline.word_timeline[1];
    assert_eq!(there.end_time - there.start_time, 5 * 70 + 120);
    assert_eq!(index.locate(there.end_time).map(|p| p.word_index), Some(1));
    assert_eq!(index.locate(timeline.total_duration), Some(timeline.word_timeline[2].position()));
}

#[test]
fn test_empty_story_is_valid() {
    for source in [
        TimingSource::Alignment(Default::default()),
        TimingSource::Estimated(EstimatorConfig::default()),
    ] {
        let timeline = build_timeline("   \n\n  ", &source, &GenerationConfig::default());
        assert_eq!(timeline.total_duration, 0);
        assert!(timeline.paragraphs.is_empty());
        assert!(TimelineIndex::from_timeline(&timeline).locate(0).is_none());
        assert!(timeline.validate().is_empty());
    }
}
