//! End-to-end production scenarios
//!
//! These drive the whole album loop with a scripted chat service and the
//! mock audio model: planning, context propagation, per-track failure
//! isolation, persistence, and the mastering pass.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use maestro::arbiter::GpuOccupant;
use maestro::blueprint::Blueprint;
use maestro::chat::ChatService;
use maestro::config::{StudioConfig, PROMPT_TAGGER, PROMPT_WRITER};
use maestro::error::Result;
use maestro::ledger::Ledger;
use maestro::pipeline::{execute_album, produce_single_track, ProductionServices};
use maestro::postprocess::{PostProcessor, MASTER_LOG};
use maestro::synth::MockAudioModel;

/// Chat stub answering by role: planner, writer, or tagger.
struct ScriptedChat {
    plan_response: String,
    lyrics_response: String,
    tags_response: String,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    fn new(plan_response: &str) -> Self {
        Self {
            plan_response: plan_response.to_string(),
            lyrics_response: "**[VERSE 1]**\nNeon lights across the bay tonight\n[CHORUS]\nWe run until the morning"
                .to_string(),
            tags_response: "Electronic, Dark, Female, Energetic".to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn writer_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(system, _)| system == PROMPT_WRITER)
            .map(|(_, user)| user.clone())
            .collect()
    }
}

impl ChatService for ScriptedChat {
    fn chat(&self, system_prompt: &str, user_content: &str, _temperature: f32) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_content.to_string()));

        if system_prompt == PROMPT_WRITER {
            Ok(self.lyrics_response.clone())
        } else if system_prompt == PROMPT_TAGGER {
            Ok(self.tags_response.clone())
        } else {
            Ok(self.plan_response.clone())
        }
    }

    fn check_connection(&self) -> Result<String> {
        Ok("scripted-model".to_string())
    }
}

impl GpuOccupant for ScriptedChat {
    fn occupant_name(&self) -> &str {
        "scripted-chat"
    }

    fn offload(&self) -> Result<bool> {
        Ok(true)
    }
}

fn test_blueprint() -> Blueprint {
    serde_json::from_str(
        r#"{
            "name": "The Storyteller",
            "description": "Narrative continuity",
            "executive_strategy": {
                "system_prompt": "You are an executive producer planning a concept album.",
                "track_count": 3
            },
            "propagation_logic": {
                "type": "narrative-arc",
                "lyric_instruction_template": "Album: {album_title}. Track {track_num}/{total_tracks}: {track_title}. Previously: {prev_context} (mood {prev_mood}). Now write about: {track_description}."
            }
        }"#,
    )
    .unwrap()
}

fn test_config(output_dir: &Path) -> StudioConfig {
    let mut config = StudioConfig {
        output_dir: output_dir.to_path_buf(),
        gpu_cooldown: Duration::ZERO,
        fade_out: Duration::from_millis(100),
        ..StudioConfig::default()
    };
    config.render.duration_sec = 1;
    config
}

const TWO_TRACK_PLAN: &str = r#"{
    "album_title": "Glass City",
    "album_theme": "urban isolation",
    "tracklist": [
        {"title": "Rooftops", "description": "a view from above", "mood": "calm"},
        {"title": "Subways", "description": "the descent", "mood": "tense"}
    ]
}"#;

#[test]
fn count_mismatch_proceeds_with_returned_tracks() {
    // Requested 3 tracks, the model returns 2: the pipeline warns and
    // proceeds, producing 2 ledgers and a 2-track master release.
    let dir = tempfile::tempdir().unwrap();
    let chat = ScriptedChat::new(TWO_TRACK_PLAN);
    let audio = MockAudioModel::new();
    let services = ProductionServices {
        chat: &chat,
        language_gpu: &chat,
        audio: &audio,
        audio_gpu: &audio,
    };
    let config = test_config(dir.path());

    let report = execute_album(&services, &config, &test_blueprint(), "Test Album", Some(3))
        .expect("pipeline should proceed despite count mismatch");

    assert_eq!(report.produced, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.album_title, "Glass City");
    assert!(report.album_dir.ends_with("ALBUM_Glass_City"));

    assert!(report.album_dir.join("01_Rooftops.wav").exists());
    assert!(report.album_dir.join("01_Rooftops.json").exists());
    assert!(report.album_dir.join("02_Subways.wav").exists());
    assert!(report.album_dir.join("02_Subways.json").exists());

    let release = PostProcessor::new(&report.album_dir).process_album().unwrap();
    assert_eq!(release.analytics.track_count, 2);
    assert_eq!(release.album_name, "Glass City");
    assert!(report.album_dir.join("DISTRIBUTION_READY").join(MASTER_LOG).exists());
}

#[test]
fn render_failure_skips_track_and_continues() {
    let three_track_plan = r#"{
        "album_title": "Storms",
        "album_theme": "weather",
        "tracklist": [
            {"title": "First Wind", "description": "", "mood": ""},
            {"title": "Eye", "description": "", "mood": ""},
            {"title": "Landfall", "description": "", "mood": ""}
        ]
    }"#;

    let dir = tempfile::tempdir().unwrap();
    let chat = ScriptedChat::new(three_track_plan);
    let audio = MockAudioModel::new().failing_on(&[2]);
    let services = ProductionServices {
        chat: &chat,
        language_gpu: &chat,
        audio: &audio,
        audio_gpu: &audio,
    };
    let config = test_config(dir.path());

    let report =
        execute_album(&services, &config, &test_blueprint(), "storm album", Some(3)).unwrap();

    assert_eq!(report.produced, 2);
    assert_eq!(report.skipped, 1);
    assert!(report.album_dir.join("01_First_Wind.wav").exists());
    assert!(!report.album_dir.join("02_Eye.wav").exists());
    assert!(report.album_dir.join("03_Landfall.wav").exists());

    // The master release reflects only the tracks that made it.
    let release = PostProcessor::new(&report.album_dir).process_album().unwrap();
    assert_eq!(release.analytics.track_count, 2);
    let topics: Vec<_> = release
        .tracks
        .iter()
        .map(|t| t.configuration.input_prompt.topic.as_str())
        .collect();
    assert_eq!(topics, ["First Wind", "Landfall"]);
}

#[test]
fn context_flows_from_track_to_track() {
    let dir = tempfile::tempdir().unwrap();
    let chat = ScriptedChat::new(TWO_TRACK_PLAN);
    let audio = MockAudioModel::new();
    let services = ProductionServices {
        chat: &chat,
        language_gpu: &chat,
        audio: &audio,
        audio_gpu: &audio,
    };
    let config = test_config(dir.path());

    execute_album(&services, &config, &test_blueprint(), "city", None).unwrap();

    let writer_prompts = chat.writer_prompts();
    assert_eq!(writer_prompts.len(), 2);

    // First track sees the sentinels.
    assert!(writer_prompts[0].contains("None (First Track)"));
    assert!(writer_prompts[0].contains("mood Neutral"));

    // Second track sees a summary of the first track's normalized lyrics.
    assert!(writer_prompts[1].contains("[VERSE 1]"));
    assert!(writer_prompts[1].contains("mood calm"));

    // Numbering placeholders resolved.
    assert!(writer_prompts[0].contains("Track 1/2"));
    assert!(writer_prompts[1].contains("Track 2/2"));
}

#[test]
fn ledgers_record_normalized_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let chat = ScriptedChat::new(TWO_TRACK_PLAN);
    let audio = MockAudioModel::new();
    let services = ProductionServices {
        chat: &chat,
        language_gpu: &chat,
        audio: &audio,
        audio_gpu: &audio,
    };
    let config = test_config(dir.path());

    let report = execute_album(&services, &config, &test_blueprint(), "city", None).unwrap();

    let ledger = Ledger::load(&report.album_dir.join("01_Rooftops.json")).unwrap();
    // Bold section markers were normalized before persisting.
    assert!(ledger.configuration.input_prompt.lyrics.contains("[VERSE 1]"));
    assert!(!ledger.configuration.input_prompt.lyrics.contains("**"));
    // Curated tags: anchor first, lowercase.
    assert_eq!(
        ledger.configuration.input_prompt.tags.as_slice()[0],
        "electronic"
    );
    assert_eq!(ledger.automated_metrics.audit_status, "PENDING");
    assert_eq!(ledger.status, "PRODUCED");
    assert_eq!(ledger.configuration.duration_sec, 1);
}

#[test]
fn single_track_production() {
    let dir = tempfile::tempdir().unwrap();
    let chat = ScriptedChat::new("unused plan");
    let audio = MockAudioModel::new();
    let services = ProductionServices {
        chat: &chat,
        language_gpu: &chat,
        audio: &audio,
        audio_gpu: &audio,
    };
    let config = test_config(dir.path());

    let track = produce_single_track(&services, &config, "Midnight Drive").unwrap();
    assert_eq!(track.title, "Midnight Drive");
    assert!(track.wav_path.exists());
    assert!(track.wav_path.with_extension("json").exists());
    assert_eq!(audio.render_count(), 1);
}
