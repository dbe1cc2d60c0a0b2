use crate::llm::{GenerationConfig, RawCompletion};
use crate::locale::Locale;
use crate::markers::{self, LEAKAGE_MARKERS};

/// Turns an engine completion into the reply shown to the user.
///
/// Never fails: a missing completion, zero choices, or text that is empty
/// once role-label leakage is cut away all map to a fixed fallback.
#[derive(Clone, Debug)]
pub struct ResponseExtractor {
    markers: Vec<String>,
    locale: Locale,
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::for_generation(&GenerationConfig::default(), Locale::default())
    }
}

impl ResponseExtractor {
    /// Uses `markers` verbatim as the priority-ordered leakage list.
    pub fn new(markers: Vec<String>, locale: Locale) -> Self {
        let markers = markers.into_iter().filter(|m| !m.is_empty()).collect();
        Self { markers, locale }
    }

    /// Built-in leakage markers followed by whatever else `cfg` stops on.
    pub fn for_generation(cfg: &GenerationConfig, locale: Locale) -> Self {
        Self {
            markers: markers::merge_markers(LEAKAGE_MARKERS, &cfg.stop_sequences),
            locale,
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn extract(&self, raw: Option<&RawCompletion>) -> String {
        let Some(choice) = raw.and_then(RawCompletion::first) else {
            return self.locale.no_reply().to_string();
        };
        let reply = self.truncate_at_marker(choice.text.trim());
        if reply.trim().is_empty() {
            return self.locale.need_more_info().to_string();
        }
        reply.to_string()
    }

    /// Cuts `text` before the first occurrence of the highest-priority
    /// marker it contains. Later markers are not consulted once one hits.
    pub fn truncate_at_marker<'a>(&self, text: &'a str) -> &'a str {
        for marker in &self.markers {
            if let Some(pos) = text.find(marker.as_str()) {
                return text[..pos].trim();
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionChoice;

    fn en() -> ResponseExtractor {
        ResponseExtractor::for_generation(&GenerationConfig::default(), Locale::En)
    }

    fn extract_text(x: &ResponseExtractor, text: &str) -> String {
        x.extract(Some(&RawCompletion::from_text(text)))
    }

    #[test]
    fn absent_or_empty_completion_gives_the_same_fallback() {
        let x = en();
        let none = x.extract(None);
        let empty = x.extract(Some(&RawCompletion::default()));
        assert_eq!(none, "unable to generate a reply");
        assert_eq!(none, empty);
        assert_eq!(x.extract(None), none);
    }

    #[test]
    fn truncates_at_full_width_marker() {
        assert_eq!(extract_text(&en(), "Hello there\nUser：what now"), "Hello there");
    }

    #[test]
    fn truncates_at_half_width_marker() {
        assert_eq!(extract_text(&en(), "It's sunny today.\nUser:"), "It's sunny today.");
    }

    #[test]
    fn only_a_marker_yields_need_more_info() {
        let x = en();
        assert_eq!(extract_text(&x, "User："), "need more information to answer");
        assert_eq!(extract_text(&x, "   \n\t "), "need more information to answer");
        assert_eq!(extract_text(&x, ""), "need more information to answer");
    }

    #[test]
    fn clean_text_is_trimmed_only() {
        assert_eq!(extract_text(&en(), "  plain answer \n"), "plain answer");
    }

    #[test]
    fn chinese_markers_and_fallbacks() {
        let x = ResponseExtractor::default();
        assert_eq!(extract_text(&x, "今天天气晴朗。\n用户：明天呢"), "今天天气晴朗。");
        assert_eq!(extract_text(&x, "问题：什么"), "我需要更多信息来回答您的问题。");
        assert_eq!(x.extract(None), "抱歉，我无法生成回复。");
    }

    #[test]
    fn first_marker_in_priority_order_wins_over_earlier_position() {
        // "Q:" appears first in the text, but the user label ranks higher.
        let x = ResponseExtractor::new(vec!["User:".into(), "Q:".into()], Locale::En);
        assert_eq!(x.truncate_at_marker("a Q: b User: c"), "a Q: b");
    }

    #[test]
    fn scanning_stops_after_first_hit() {
        let x = ResponseExtractor::new(vec!["B:".into(), "A:".into()], Locale::En);
        // after cutting at "B:" the remaining "x A: y" is returned as-is
        assert_eq!(x.truncate_at_marker("x A: y B: z"), "x A: y");
    }

    #[test]
    fn uses_first_choice_only() {
        let raw = RawCompletion {
            choices: vec![
                CompletionChoice {
                    text: " first ".into(),
                    finish_reason: Some("stop".into()),
                },
                CompletionChoice {
                    text: "second".into(),
                    finish_reason: None,
                },
            ],
            usage: None,
        };
        assert_eq!(en().extract(Some(&raw)), "first");
    }

    #[test]
    fn extra_stop_sequences_become_markers() {
        let cfg = GenerationConfig {
            stop_sequences: vec!["<|end|>".into()],
            ..GenerationConfig::default()
        };
        let x = ResponseExtractor::for_generation(&cfg, Locale::En);
        assert_eq!(extract_text(&x, "done<|end|>junk"), "done");
        assert_eq!(x.markers().last().map(String::as_str), Some("<|end|>"));
    }

    #[test]
    fn empty_markers_are_ignored() {
        let x = ResponseExtractor::new(vec![String::new()], Locale::En);
        assert!(x.markers().is_empty());
        assert_eq!(extract_text(&x, "keep me"), "keep me");
    }
}
