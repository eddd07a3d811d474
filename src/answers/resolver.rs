use std::sync::LazyLock;

use chrono::NaiveDate;

use super::matcher::AnswerPattern;
use super::{AnswerError, AnswerMode, AnswerValue, Extraction, FailureLog};

/// Everything before (and including) this marker is reasoning, not the answer.
pub const FINAL_ANSWER_MARKER: &str = "### Final Answer";

static LINE_PATTERN: LazyLock<AnswerPattern> = LazyLock::new(|| {
    AnswerPattern::free_text(r".+").expect("Invalid built-in answer target")
});
static WORD_PATTERN: LazyLock<AnswerPattern> =
    LazyLock::new(|| builtin(r"\S+"));
static NUMBER_PATTERN: LazyLock<AnswerPattern> =
    LazyLock::new(|| builtin(r"[\d,]+"));
static DATE_PATTERN: LazyLock<AnswerPattern> =
    LazyLock::new(|| builtin(r"\S+"));

fn builtin(target: &str) -> AnswerPattern {
    AnswerPattern::new(target).expect("Invalid built-in answer target")
}

/// One way of pulling a raw answer out of text.
#[derive(Debug, Clone, Copy)]
enum Strategy<'a> {
    Template(&'a AnswerPattern),
    /// First non-blank line, trimmed.
    FirstLine,
    /// First whitespace-delimited token.
    FirstWord,
}

impl Strategy<'_> {
    fn apply(&self, text: &str) -> Option<String> {
        match self {
            Self::Template(pattern) => pattern.extract_one(text),
            Self::FirstLine => text
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string),
            Self::FirstWord => text.split_whitespace().next().map(str::to_string),
        }
    }
}

/// First strategy to produce a value wins.
fn first_success(strategies: &[Strategy<'_>], text: &str) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy.apply(text))
}

/// Fixed-target modes declare their strategies up front.
fn strategies_for(mode: AnswerMode) -> Vec<Strategy<'static>> {
    match mode {
        AnswerMode::Line => vec![Strategy::Template(&LINE_PATTERN), Strategy::FirstLine],
        AnswerMode::Word => vec![Strategy::Template(&WORD_PATTERN), Strategy::FirstWord],
        AnswerMode::Number => vec![Strategy::Template(&NUMBER_PATTERN)],
        AnswerMode::Date => vec![Strategy::Template(&DATE_PATTERN)],
        AnswerMode::Ignore | AnswerMode::Free | AnswerMode::Single | AnswerMode::Multi => {
            vec![]
        }
    }
}

/// Alternation of the legal values.
///
/// The list is reversed before joining. With leftmost-first alternation this
/// decides which of two prefix-overlapping codes ("1" and "10") is tried first,
/// and changing it changes which answers are read.
pub fn legal_alternation<S: AsRef<str>>(legal_values: &[S]) -> String {
    legal_values
        .iter()
        .rev()
        .map(|v| regex::escape(v.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Legal values chained by commas or hyphens, with optional spaces around them.
pub fn multi_target<S: AsRef<str>>(legal_values: &[S]) -> String {
    let lv = legal_alternation(legal_values);
    format!(r"(?:{lv})(?:(?:\s*[-,]\s*)(?:{lv}))*")
}

/// Text after the last-resort `### Final Answer` marker, or all of it.
pub fn after_final_answer(text: &str) -> &str {
    match text.split_once(FINAL_ANSWER_MARKER) {
        Some((_, rest)) => rest,
        None => text,
    }
}

/// Turns raw model replies into normalized answers for a given mode.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    failure_log: Option<FailureLog>,
}

impl Resolver {
    pub fn new(failure_log: FailureLog) -> Self {
        Self {
            failure_log: Some(failure_log),
        }
    }

    /// A resolver that only reports failures through `tracing`.
    pub fn without_failure_log() -> Self {
        Self { failure_log: None }
    }

    pub fn failure_log(&self) -> Option<&FailureLog> {
        self.failure_log.as_ref()
    }

    /// Extract the answer to `prompt` from `text`.
    ///
    /// `legal_values` are required for `Single`/`Multi` and ignored otherwise.
    /// Failures in strict modes are logged; logging never alters the result.
    pub fn resolve<S: AsRef<str>>(
        &self,
        prompt: &str,
        text: &str,
        mode: AnswerMode,
        legal_values: &[S],
    ) -> Result<Extraction, AnswerError> {
        let text = after_final_answer(text);

        let extraction = match mode {
            AnswerMode::Ignore => Extraction::success(AnswerValue::Empty),
            AnswerMode::Free => Extraction::success(AnswerValue::Text(text.to_string())),
            AnswerMode::Line | AnswerMode::Word | AnswerMode::Number => {
                match first_success(&strategies_for(mode), text) {
                    Some(value) => Extraction::success(AnswerValue::Text(value)),
                    None => Extraction::failure(None),
                }
            }
            AnswerMode::Date => match first_success(&strategies_for(mode), text) {
                Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                    Ok(date) => Extraction::success(AnswerValue::Date(date)),
                    Err(_) => Extraction::failure(Some(AnswerValue::Text(raw))),
                },
                None => Extraction::failure(None),
            },
            AnswerMode::Single => {
                let pattern = AnswerPattern::new(&legal_alternation(legal_values))?;
                match first_success(&[Strategy::Template(&pattern)], text) {
                    Some(code) => Extraction::success(AnswerValue::Text(code)),
                    None => Extraction::failure(None),
                }
            }
            AnswerMode::Multi => {
                let pattern = AnswerPattern::new(&multi_target(legal_values))?;
                match pattern.extract_all(text) {
                    Some(codes) => Extraction::success(AnswerValue::Codes(
                        codes.into_iter().map(|c| c.trim().to_string()).collect(),
                    )),
                    None => Extraction::failure(Some(AnswerValue::Text(text.to_string()))),
                }
            }
        };

        if !extraction.ok && mode.logs_failures() {
            tracing::warn!(mode = %mode, "Could not extract a legal answer");
            if let Some(log) = &self.failure_log {
                log.record(mode, prompt, text);
            }
        }

        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_CODES: &[&str] = &[];

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn resolve(text: &str, mode: AnswerMode, legal: &[&str]) -> Extraction {
        Resolver::without_failure_log()
            .resolve("prompt", text, mode, legal)
            .unwrap()
    }

    fn text(value: &str) -> Option<AnswerValue> {
        Some(AnswerValue::Text(value.to_string()))
    }

    // =================================================================
    // PRE-STEP AND PASS-THROUGH MODES
    // =================================================================

    #[test]
    fn final_answer_marker_discards_reasoning() {
        assert_eq!(after_final_answer("Answer: 1\n### Final Answer\nAnswer: 2"), "\nAnswer: 2");
        assert_eq!(after_final_answer("Answer: 1"), "Answer: 1");
    }

    #[test]
    fn ignore_always_empty() {
        assert_eq!(
            resolve("whatever", AnswerMode::Ignore, NO_CODES),
            Extraction::success(AnswerValue::Empty)
        );
    }

    #[test]
    fn free_returns_text_after_marker() {
        let result = resolve("musing\n### Final Answer\nI like tea", AnswerMode::Free, NO_CODES);
        assert!(result.ok);
        assert_eq!(result.value, text("\nI like tea"));
    }

    // =================================================================
    // LINE / WORD
    // =================================================================

    #[test]
    fn line_from_answer_prefix() {
        let result = resolve("Sure.\nAnswer: I like long walks", AnswerMode::Line, NO_CODES);
        assert!(result.ok);
        assert_eq!(result.value, text("I like long walks"));
    }

    #[test]
    fn line_keeps_repeated_words() {
        let result = resolve("Answer: yes yes", AnswerMode::Line, NO_CODES);
        assert_eq!(result.value.as_ref().and_then(AnswerValue::as_text), Some("yes yes"));
        // Word answers still reduce to one token
        assert_eq!(resolve("Answer: yes", AnswerMode::Word, NO_CODES).value, text("yes"));
    }

    #[test]
    fn line_falls_back_to_first_line() {
        let result = resolve(
            "\n  Nurse in a small town  \nsecond line\n",
            AnswerMode::Line,
            NO_CODES,
        );
        assert!(result.ok);
        assert_eq!(result.value, text("Nurse in a small town"));
    }

    #[test]
    fn word_from_answer_prefix() {
        assert_eq!(resolve("Answer: Toronto", AnswerMode::Word, NO_CODES).value, text("Toronto"));
    }

    #[test]
    fn word_falls_back_to_first_token() {
        let result = resolve("Hmm\nI could go either way\nno idea", AnswerMode::Word, NO_CODES);
        assert!(result.ok);
        assert_eq!(result.value, text("Hmm"));
    }

    #[test]
    fn line_and_word_fail_on_blank_text() {
        assert_eq!(resolve("   \n ", AnswerMode::Line, NO_CODES), Extraction::failure(None));
        assert_eq!(resolve("", AnswerMode::Word, NO_CODES), Extraction::failure(None));
    }

    // =================================================================
    // NUMBER / DATE
    // =================================================================

    #[test]
    fn number_extracted() {
        assert_eq!(resolve("Answer: 42", AnswerMode::Number, NO_CODES).value, text("42"));
    }

    #[test]
    fn number_without_match_fails() {
        assert_eq!(
            resolve("I'd rather not say", AnswerMode::Number, NO_CODES),
            Extraction::failure(None)
        );
    }

    #[test]
    fn date_parsed() {
        let result = resolve("Answer: 1990-04-17", AnswerMode::Date, NO_CODES);
        assert!(result.ok);
        assert_eq!(
            result.value,
            Some(AnswerValue::Date(NaiveDate::from_ymd_opt(1990, 4, 17).unwrap()))
        );
    }

    #[test]
    fn invalid_calendar_date_keeps_raw_text() {
        let result = resolve("Answer: 2024-13-40", AnswerMode::Date, NO_CODES);
        assert_eq!(result, Extraction::failure(text("2024-13-40")));
    }

    // =================================================================
    // SINGLE / MULTI
    // =================================================================

    #[test]
    fn single_legal_code() {
        let result = resolve("Answer: 3", AnswerMode::Single, &["1", "2", "3", "4"]);
        assert_eq!(result, Extraction::success(AnswerValue::Text("3".into())));
    }

    #[test]
    fn single_prefers_later_declared_overlapping_code() {
        let legal = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];
        assert_eq!(resolve("Answer: 10", AnswerMode::Single, &legal).value, text("10"));
    }

    #[test]
    fn single_without_legal_match_fails() {
        let result = resolve("Answer: 9", AnswerMode::Single, &["1", "2"]);
        assert_eq!(result, Extraction::failure(None));
    }

    #[test]
    fn single_legal_values_escaped() {
        let result = resolve("Answer: a.b", AnswerMode::Single, &["a.b", "c+"]);
        assert_eq!(result.value, text("a.b"));
        assert!(!resolve("Answer: axb", AnswerMode::Single, &["a.b"]).ok);
    }

    #[test]
    fn multi_round_trip() {
        let result = resolve("Answer: 2-3-4", AnswerMode::Multi, &["1", "2", "3", "4"]);
        assert_eq!(result, Extraction::success(AnswerValue::Codes(codes(&["2", "3", "4"]))));
    }

    #[test]
    fn multi_accepts_commas_with_spaces() {
        let result = resolve("Answer: 4, 1 ,2", AnswerMode::Multi, &["1", "2", "3", "4"]);
        assert_eq!(result.value, Some(AnswerValue::Codes(codes(&["1", "2", "4"]))));
    }

    #[test]
    fn multi_failure_returns_text() {
        let raw = "I don't identify with any of these.";
        let result = resolve(raw, AnswerMode::Multi, &["1", "2"]);
        assert_eq!(result, Extraction::failure(text(raw)));
    }

    #[test]
    fn resolve_is_idempotent() {
        let legal = ["1", "2", "3"];
        let reply = "Thinking it over.\n**Answer: 2**";
        let first = resolve(reply, AnswerMode::Single, &legal);
        let second = resolve(reply, AnswerMode::Single, &legal);
        assert_eq!(first, second);
        assert!(first.ok);
    }

    #[test]
    fn owned_legal_values_accepted() {
        let legal = codes(&["1", "2"]);
        let result = Resolver::without_failure_log()
            .resolve("p", "Answer: 2", AnswerMode::Single, &legal)
            .unwrap();
        assert!(result.ok);
    }

    // =================================================================
    // FAILURE LOGGING
    // =================================================================

    #[test]
    fn strict_mode_failure_logged() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(FailureLog::new(tmp.path().join("errors.txt")));

        let result = resolver
            .resolve("Pick one", "", AnswerMode::Single, &["1", "2"])
            .unwrap();
        assert_eq!(result, Extraction::failure(None));

        let content = std::fs::read_to_string(tmp.path().join("errors.txt")).unwrap();
        assert!(content.contains("mode = single"));
        assert!(content.contains("Pick one"));
    }

    #[test]
    fn date_parse_failure_logged() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(FailureLog::new(tmp.path().join("errors.txt")));

        resolver
            .resolve("Birthday?", "Answer: 2024-13-40", AnswerMode::Date, NO_CODES)
            .unwrap();

        let content = std::fs::read_to_string(tmp.path().join("errors.txt")).unwrap();
        assert!(content.contains("mode = date"));
        assert!(content.contains("Answer: 2024-13-40"));
    }

    #[test]
    fn lenient_modes_and_successes_not_logged() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("errors.txt");
        let resolver = Resolver::new(FailureLog::new(&path));

        resolver.resolve("p", "", AnswerMode::Line, NO_CODES).unwrap();
        resolver.resolve("p", "Answer: 1", AnswerMode::Single, &["1"]).unwrap();

        assert!(!path.exists());
    }
}
