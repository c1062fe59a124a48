use crate::domain::contract::LlmAnalysisPayload;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Best-effort extraction of the structured payload from free-form model text.
///
/// Tries the interior of the first ```json fence, then the whole trimmed text. Malformed
/// model output is expected, not exceptional, so failure is `None` rather than an error.
pub fn extract_payload(raw: &str) -> Option<LlmAnalysisPayload> {
    if let Some(block) = first_fenced_block(raw) {
        if let Ok(payload) = serde_json::from_str::<LlmAnalysisPayload>(block) {
            return Some(payload);
        }
        // Malformed interior still falls through to whole-text parsing.
    }
    serde_json::from_str::<LlmAnalysisPayload>(raw.trim()).ok()
}

fn first_fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE_OPEN)? + FENCE_OPEN.len();
    let rest = &text[start..];
    let end = rest.find(FENCE_CLOSE)?;
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_wins_over_surrounding_prose() {
        let raw = "Here is the report:\n```json\n{\"summary\":\"up\"}\n```\nThanks!";
        let payload = extract_payload(raw).unwrap();
        assert_eq!(payload.summary.as_deref(), Some("up"));
    }

    #[test]
    fn only_the_first_fence_is_used() {
        let raw = "```json\n{\"summary\":\"first\"}\n```\n```json\n{\"summary\":\"second\"}\n```";
        let payload = extract_payload(raw).unwrap();
        assert_eq!(payload.summary.as_deref(), Some("first"));
    }

    #[test]
    fn whole_text_parses_without_a_fence() {
        let payload = extract_payload("  {\"summary\":\"plain\"}  ").unwrap();
        assert_eq!(payload.summary.as_deref(), Some("plain"));
    }

    #[test]
    fn malformed_fence_interior_falls_through_to_whole_text() {
        // Fence markers inside a JSON string: the fence path fails to parse, the
        // whole-text path succeeds.
        let raw = "{\"summary\":\"mentions ```json fences``` in prose\"}";
        let payload = extract_payload(raw).unwrap();
        assert!(payload.summary.unwrap().contains("fences"));
    }

    #[test]
    fn broken_fence_and_broken_text_give_none() {
        assert!(extract_payload("```json\n{\"summary\": \n```").is_none());
    }

    #[test]
    fn garbage_returns_none_never_panics() {
        assert!(extract_payload("").is_none());
        assert!(extract_payload("no json at all").is_none());
        assert!(extract_payload("prefix {\"a\":1} suffix").is_none());
        assert!(extract_payload("42").is_none());
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let payload = extract_payload("{\"summary\":\"s\",\"extra\":[1,2,3]}").unwrap();
        assert_eq!(payload.summary.as_deref(), Some("s"));
    }
}
