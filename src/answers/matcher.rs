use std::collections::{BTreeSet, HashSet};

use regex::{Regex, RegexBuilder};

use super::templates::{AnswerTemplate, Capture, TARGET_PLACEHOLDER, TEMPLATES};
use super::AnswerError;

/// Target used when the caller has no opinion: a hyphen-chained run of
/// digits, or a single letter.
pub const DEFAULT_TARGET: &str = r"\d+(?:-\d+)*|[A-Z]";

/// The answer templates compiled for one target sub-pattern.
///
/// Compile once per target and reuse; matching itself is stateless.
#[derive(Debug, Clone)]
pub struct AnswerPattern {
    target: String,
    templates: Vec<CompiledTemplate>,
    /// Return a repeated match verbatim before reducing it to tokens.
    free_text: bool,
    /// Whole-string form of the target, for brace-delimited captures.
    anchored: Regex,
}

#[derive(Debug, Clone)]
struct CompiledTemplate {
    name: &'static str,
    regex: Regex,
    capture: Capture,
}

impl AnswerPattern {
    pub fn new(target: &str) -> Result<Self, AnswerError> {
        // Reject a broken target on its own so the error names it, not a template.
        Regex::new(target).map_err(|source| AnswerError::InvalidPattern {
            pattern: target.to_string(),
            source,
        })?;

        let wrapped = format!("#?((?:{target}))");
        let templates = TEMPLATES
            .iter()
            .map(|template| compile_template(template, &wrapped))
            .collect::<Result<Vec<_>, _>>()?;
        let anchored = build_regex(&format!(r"^\s*{wrapped}\s*$"), false)?;

        Ok(Self {
            target: target.to_string(),
            templates,
            free_text: false,
            anchored,
        })
    }

    /// Like [`AnswerPattern::new`], but a template whose matches all agree is
    /// answered with the first match as written, so `"yes yes"` stays intact.
    pub fn free_text(target: &str) -> Result<Self, AnswerError> {
        Ok(Self {
            free_text: true,
            ..Self::new(target)?
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Exactly one answer, from the highest-priority template that agrees on one.
    ///
    /// A template whose matches disagree is skipped, not reported.
    pub fn extract_one(&self, text: &str) -> Option<String> {
        let text = text.trim();
        for template in &self.templates {
            let candidates = self.candidates(template, text);
            if candidates.is_empty() {
                continue;
            }

            let unique: BTreeSet<String> = candidates.iter().flat_map(|c| tokenize(c)).collect();
            if unique.is_empty() {
                continue;
            }
            if self.free_text {
                if let Some(line) = agreed_chain(&candidates) {
                    tracing::debug!(template = template.name, "Answer template matched line");
                    return Some(line);
                }
            }
            if unique.len() == 1 {
                tracing::debug!(template = template.name, "Answer template matched");
                return unique.into_iter().next();
            }

            // One chained answer ("2-3-4", "1, 2") repeated or alone still counts.
            if let Some(chain) = agreed_chain(&candidates) {
                tracing::debug!(template = template.name, "Answer template matched chain");
                return Some(chain);
            }

            tracing::debug!(
                template = template.name,
                distinct = unique.len(),
                "Ambiguous answer template, trying next"
            );
        }
        None
    }

    /// Every distinct token from the highest-priority template that matched,
    /// lexically sorted.
    pub fn extract_all(&self, text: &str) -> Option<Vec<String>> {
        let text = text.trim();
        for template in &self.templates {
            let unique: BTreeSet<String> = self
                .candidates(template, text)
                .iter()
                .flat_map(|c| tokenize(c))
                .collect();
            if !unique.is_empty() {
                tracing::debug!(
                    template = template.name,
                    count = unique.len(),
                    "Answer template matched"
                );
                return Some(unique.into_iter().collect());
            }
        }
        None
    }

    fn candidates(&self, template: &CompiledTemplate, text: &str) -> Vec<String> {
        template
            .regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| match template.capture {
                Capture::Target => Some(m.as_str().to_string()),
                Capture::BareBraces => self
                    .anchored
                    .captures(m.as_str())
                    .and_then(|inner| inner.get(1))
                    .map(|inner| inner.as_str().to_string()),
            })
            .collect()
    }
}

/// The first candidate, trimmed, when every candidate is the same token chain.
fn agreed_chain(candidates: &[String]) -> Option<String> {
    let chains: HashSet<String> = candidates.iter().map(|c| tokenize(c).join("-")).collect();
    if chains.len() == 1 {
        candidates.first().map(|c| c.trim().to_string())
    } else {
        None
    }
}

fn compile_template(
    template: &AnswerTemplate,
    wrapped: &str,
) -> Result<CompiledTemplate, AnswerError> {
    let pattern = template.pattern.replace(TARGET_PLACEHOLDER, wrapped);
    Ok(CompiledTemplate {
        name: template.name,
        regex: build_regex(&pattern, true)?,
        capture: template.capture,
    })
}

fn build_regex(pattern: &str, multi_line: bool) -> Result<Regex, AnswerError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(multi_line)
        .build()
        .map_err(|source| AnswerError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Split a matched answer into component tokens. Commas, hyphens and
/// whitespace all separate, so `"1, 2"` and `"1-2"` are the same answer.
fn tokenize(candidate: &str) -> Vec<String> {
    candidate
        .split(|c: char| c == ',' || c == '-' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Single answer with the given target (or [`DEFAULT_TARGET`]).
pub fn extract_answer(text: &str, target: Option<&str>) -> Result<Option<String>, AnswerError> {
    let pattern = AnswerPattern::new(target.unwrap_or(DEFAULT_TARGET))?;
    Ok(pattern.extract_one(text))
}

/// All answers with the given target (or [`DEFAULT_TARGET`]).
pub fn extract_answers(
    text: &str,
    target: Option<&str>,
) -> Result<Option<Vec<String>>, AnswerError> {
    let pattern = AnswerPattern::new(target.unwrap_or(DEFAULT_TARGET))?;
    Ok(pattern.extract_all(text))
}

/// The value every match of `pattern` agrees on, or `None` when matches
/// disagree or there are none.
pub fn pattern_consensus(pattern: &str, text: &str) -> Result<Option<String>, AnswerError> {
    let regex = build_regex(pattern, true)?;
    let values: HashSet<String> = captured_values(&regex, text.trim())
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect();
    if values.len() == 1 {
        Ok(values.into_iter().next())
    } else {
        Ok(None)
    }
}

/// Every distinct value captured by `pattern`, in first-seen order.
pub fn pattern_all(pattern: &str, text: &str) -> Result<Vec<String>, AnswerError> {
    let regex = build_regex(pattern, true)?;
    let mut seen = HashSet::new();
    Ok(captured_values(&regex, text)
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect())
}

/// Group captures of every match, flattened; the whole match when the
/// pattern has no groups.
fn captured_values(regex: &Regex, text: &str) -> Vec<String> {
    let mut values = Vec::new();
    for caps in regex.captures_iter(text) {
        if caps.len() == 1 {
            values.push(caps[0].to_string());
            continue;
        }
        values.extend(caps.iter().skip(1).flatten().map(|m| m.as_str().to_string()));
    }
    values
}
