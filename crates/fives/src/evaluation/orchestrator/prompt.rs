use super::super::classifier::ClassificationRequest;
use super::super::domain::PhotoPayload;

/// At most this many photos reach the classifier.
pub const MAX_PHOTOS: usize = 4;
/// Per-photo character budget inside the outbound prompt.
pub const MAX_PHOTO_CHARS: usize = 10_000;

pub const SYSTEM_INSTRUCTION: &str = "You are a 5S workplace organization expert. You MUST \
respond with ONLY a single, valid JSON object containing exactly these fields: sortScore \
(integer 1-10), setInOrderScore (integer 1-10), shineScore (integer 1-10), standardizeScore \
(integer, must be 0 if base score < 22), sustainScore (integer, must be 0 if base score < 22), \
and feedback (string). NO OTHER TEXT OR FORMATTING IS ALLOWED.";

const PROMPT_HEADER: &str = "As a 5S workplace organization expert, analyze these workspace \
photos and provide scores and feedback. Respond with ONLY a JSON object containing these exact \
fields:

{
  \"sortScore\": (integer 1-10),
  \"setInOrderScore\": (integer 1-10),
  \"shineScore\": (integer 1-10),
  \"standardizeScore\": (integer, must be 0 if base score < 22),
  \"sustainScore\": (integer, must be 0 if base score < 22),
  \"feedback\": \"Detailed feedback string\"
}

Base64 photo data: ";

/// Bounds applied to the photo set before it is embedded in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoLimits {
    pub max_photos: usize,
    pub max_photo_chars: usize,
}

impl Default for PhotoLimits {
    fn default() -> Self {
        Self {
            max_photos: MAX_PHOTOS,
            max_photo_chars: MAX_PHOTO_CHARS,
        }
    }
}

/// Keeps the first `max_photos` entries, truncates each to the character
/// budget and drops blank ones. An empty result is the caller's problem.
pub fn shape_photos(photos: &[PhotoPayload], limits: PhotoLimits) -> Vec<PhotoPayload> {
    photos
        .iter()
        .take(limits.max_photos)
        .map(|photo| PhotoPayload(truncate_chars(photo.as_str(), limits.max_photo_chars).to_string()))
        .filter(|photo| !photo.is_blank())
        .collect()
}

pub fn build_request(photos: &[PhotoPayload]) -> ClassificationRequest {
    let joined = photos
        .iter()
        .map(PhotoPayload::as_str)
        .collect::<Vec<_>>()
        .join(" | ");

    ClassificationRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        prompt: format!("{PROMPT_HEADER}{joined}"),
    }
}

fn truncate_chars(raw: &str, limit: usize) -> &str {
    match raw.char_indices().nth(limit) {
        Some((cut, _)) => &raw[..cut],
        None => raw,
    }
}
