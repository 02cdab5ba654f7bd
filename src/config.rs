//! Studio configuration
//!
//! A single explicit value threaded through every pipeline call. Nothing
//! in the core reads ambient/global state; the CLI builds one of these and
//! passes it down.

use std::path::PathBuf;
use std::time::Duration;

/// Internal sample rate for all rendered audio.
pub const SAMPLE_RATE: u32 = 48_000;

/// Engine identifier written into every ledger's provenance section.
pub const ENGINE_UID: &str = "Maestro-Hybrid-Studio";

/// System prompt for the lyric-writer role.
pub const PROMPT_WRITER: &str = "You are a professional Songwriter. Write clean lyrics based on the user's topic.\n\
STRICT FORMATTING:\n\
1. Use UPPERCASE tags in brackets: [INTRO], [VERSE 1], [CHORUS], [BRIDGE], [OUTRO].\n\
2. Do NOT use markdown bolding (**).\n\
3. Write ONLY the lyrics and structure tags.\n\
4. Do not add any decorations yet.";

/// System prompt for the tagger role.
pub const PROMPT_TAGGER: &str = "You are a Metadata Specialist. Analyze the lyrics and select tags.\n\
STRICT RULES:\n\
1. Select ONE tag for 'GENRE' (Mandatory).\n\
2. Select tags for Timbre, Gender, Mood.\n\
3. Output a simple comma-separated list of words only.\n\
4. Example: Electronic, Dark, Female, Energetic, Synthesizer";

/// Named lyric-decoration strategies.
///
/// Applied between drafting and tagging when selected in the config. The
/// decorated text still goes through the structural tag normalizer, so
/// section markers survive whatever the decorator does to the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoratorSchema {
    /// Pass lyrics through untouched apart from structure tags.
    #[default]
    CleanStandard,
    /// Ellipses for breath, tildes for held vowels, underscores for runs.
    SonicFlow,
    /// Parenthetical performance instructions: (whisper), (shout), ...
    DynamicPerformer,
    /// Stutters and digital-break markers for electronic styles.
    GlitchStutter,
    /// Background vocals and ad-libs in parenthesis.
    CallAndResponse,
}

impl DecoratorSchema {
    /// System prompt implementing this decoration strategy.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::CleanStandard => {
                "You are a Lyric Formatter. Output the lyrics exactly as they are.\n\
                 Ensure structure tags like [INTRO] and [CHORUS] are present.\n\
                 Do NOT add any symbols, visual effects, or parenthesis.\n\
                 Keep it clean."
            }
            Self::SonicFlow => {
                "You are a Vocal Arranger. Add symbols to control rhythm and duration.\n\
                 RULES:\n\
                 1. Add `...` (ellipses) where the singer should pause for breath.\n\
                 2. Add `~~~` (tildes) to the end of vowels to hold/elongate the note.\n\
                 3. Add `__` (underscores) between words that should be sung quickly together.\n\
                 4. Keep the [TAGS] intact."
            }
            Self::DynamicPerformer => {
                "You are a Drama Director. Add parenthetical performance instructions.\n\
                 RULES:\n\
                 1. Add (whisper), (shout), (gasp), (belting), or (spoken) before specific lines.\n\
                 2. Use `!` liberally for emphasis.\n\
                 3. Do not change the words, just add the mood instructions."
            }
            Self::GlitchStutter => {
                "You are an Electronic Music Producer. Apply 'glitch' effects to the text.\n\
                 RULES:\n\
                 1. Stutter the first letter of intense words (e.g., 'b-b-break').\n\
                 2. Repeat key phrases twice rapidly.\n\
                 3. Insert `[//]` or `[::]` to signify digital breaks/artifacts."
            }
            Self::CallAndResponse => {
                "You are a Choir Arranger. Add background vocals and ad-libs.\n\
                 RULES:\n\
                 1. Add background vocals in parenthesis at the end of lines.\n\
                 2. Examples: (Ooh yeah), (No no no), (Echoing).\n\
                 3. Ensure the main lyrics remain visible."
            }
        }
    }
}

/// Render parameters for a single track.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    /// Track duration in seconds.
    pub duration_sec: u32,
    /// Classifier-free guidance scale.
    pub cfg_scale: f32,
    /// Sampling temperature for the audio model.
    pub temperature: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            duration_sec: 120,
            cfg_scale: 1.5,
            temperature: 1.0,
        }
    }
}

/// Explicit configuration for one production run.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Base URL of the chat service (OpenAI-compatible, e.g. LM Studio).
    pub chat_url: String,
    /// Base URL of the audio-generation bridge.
    pub bridge_url: String,
    /// Root directory for album output.
    pub output_dir: PathBuf,
    /// Project root recorded in ledger provenance.
    pub project_root: PathBuf,
    /// Cooldown between GPU occupants, letting driver deallocation settle.
    pub gpu_cooldown: Duration,
    /// Fade-out applied to the tail of every rendered track.
    pub fade_out: Duration,
    /// Per-track render parameters.
    pub render: RenderSettings,
    /// Lyric decoration stage; `None` skips decoration entirely.
    pub decorator: Option<DecoratorSchema>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            chat_url: "http://localhost:1234/v1".to_string(),
            bridge_url: "http://localhost:8765".to_string(),
            output_dir: PathBuf::from("output"),
            project_root: PathBuf::from("."),
            gpu_cooldown: Duration::from_secs(5),
            fade_out: Duration::from_secs_f64(2.5),
            render: RenderSettings::default(),
            decorator: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_render_settings() {
        let settings = RenderSettings::default();
        assert_eq!(settings.duration_sec, 120);
        assert!((settings.cfg_scale - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decorator_prompts_are_distinct() {
        assert_ne!(
            DecoratorSchema::CleanStandard.system_prompt(),
            DecoratorSchema::GlitchStutter.system_prompt()
        );
    }
}
