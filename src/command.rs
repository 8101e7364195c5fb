//! Utterance classification
//!
//! Maps a raw utterance to a camera intent using ordered, locale-aware
//! pattern groups (English, Japanese, Traditional Chinese).

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// Camera selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraId {
    /// Camera 1 (front)
    Primary,
    /// Camera 2 (rear)
    Secondary,
}

impl CameraId {
    /// 1-based camera number used in messages and file names
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
        }
    }

    /// Camera for a 1-based number
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Primary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Save a full-resolution photo, no backend round-trip
    TakePhoto(CameraId),
    /// Capture an analysis image and send it with the utterance
    Analyze(CameraId),
    /// Plain chat turn
    Normal,
}

/// One pattern group and the intent it yields on a two-camera rig
struct PatternGroup {
    patterns: RegexSet,
    intent: Intent,
}

impl PatternGroup {
    fn new(patterns: &[&str], intent: Intent) -> Self {
        Self {
            patterns: RegexSet::new(patterns).expect("valid regex set"),
            intent,
        }
    }
}

/// Groups in priority order; the first group with a hit wins
static GROUPS: LazyLock<Vec<PatternGroup>> = LazyLock::new(|| {
    vec![
        PatternGroup::new(
            &[
                r"take (a )?photo from camera ?1",
                r"camera ?1で写真を撮って",
                r"カメラ ?1で写真を撮って",
                r"用camera ?一拍照",
                r"從camera ?1拍照",
                r"用相機 ?一拍照",
                r"從相機 ?1拍照",
            ],
            Intent::TakePhoto(CameraId::Primary),
        ),
        PatternGroup::new(
            &[
                r"take (a )?photo from camera ?2",
                r"camera ?2で写真を撮って",
                r"カメラ ?2で写真を撮って",
                r"用camera ?二拍照",
                r"從camera ?2拍照",
                r"用相機 ?二拍照",
                r"從相機 ?2拍照",
            ],
            Intent::TakePhoto(CameraId::Secondary),
        ),
        // "this" binds to camera 2 and "that" to camera 1
        PatternGroup::new(
            &[r"what is this\??", r"これは何\??", r"這是什麼\??"],
            Intent::Analyze(CameraId::Secondary),
        ),
        PatternGroup::new(
            &[
                r"what is that\??",
                r"あれは何\??",
                r"それは何\??",
                r"那是什麼\??",
            ],
            Intent::Analyze(CameraId::Primary),
        ),
        PatternGroup::new(
            &[r"camera 1", r"front camera"],
            Intent::Analyze(CameraId::Primary),
        ),
        PatternGroup::new(
            &[r"camera 2", r"rear camera"],
            Intent::Analyze(CameraId::Secondary),
        ),
    ]
});

/// Whitespace runs collapse so "what  is this" still matches
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Classify an utterance for a rig with `camera_count` cameras
///
/// With fewer than two cameras every camera target collapses to the
/// primary camera. The intent is returned even when no camera exists; the
/// caller reports the missing hardware.
#[must_use]
pub fn classify(utterance: &str, camera_count: usize) -> Intent {
    let normalized = WHITESPACE
        .replace_all(utterance.trim(), " ")
        .to_lowercase();

    let Some(group) = GROUPS.iter().find(|g| g.patterns.is_match(&normalized)) else {
        return Intent::Normal;
    };

    let intent = if camera_count < 2 {
        collapse_to_primary(group.intent)
    } else {
        group.intent
    };

    tracing::debug!(?intent, camera_count, "classified utterance");
    intent
}

const fn collapse_to_primary(intent: Intent) -> Intent {
    match intent {
        Intent::TakePhoto(_) => Intent::TakePhoto(CameraId::Primary),
        Intent::Analyze(_) => Intent::Analyze(CameraId::Primary),
        Intent::Normal => Intent::Normal,
    }
}
