//! Surface formats a model uses to mark its final answer.
//!
//! The table is ordered: earlier entries are more trustworthy and win over
//! later ones. `{T}` is replaced by the caller's target sub-pattern (wrapped
//! so that a leading `#` is skipped and the token itself is captured).

/// Placeholder substituted with the wrapped target pattern.
pub const TARGET_PLACEHOLDER: &str = "{T}";

/// How a template yields its candidate tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Group 1 of the template, which is the wrapped target itself.
    Target,
    /// Group 1 is everything between braces; the candidate survives only if
    /// the whole brace content matches the target.
    BareBraces,
}

/// One entry of the priority table.
#[derive(Debug, Clone, Copy)]
pub struct AnswerTemplate {
    pub name: &'static str,
    pub pattern: &'static str,
    pub capture: Capture,
}

const fn target(name: &'static str, pattern: &'static str) -> AnswerTemplate {
    AnswerTemplate {
        name,
        pattern,
        capture: Capture::Target,
    }
}

/// Highest priority first.
pub const TEMPLATES: &[AnswerTemplate] = &[
    // A "Final Answer" heading followed by an Answer: line
    target(
        "final_answer_block",
        r"\*\*\s*Final Answer\s*:?[*\s]*Answer:\s*{T}",
    ),
    AnswerTemplate {
        name: "latex_boxed",
        pattern: r"\\boxed\{([^}]+)\}",
        capture: Capture::BareBraces,
    },
    target("answer_selected", r"Answer Selected:\s*{T}"),
    target("answer_selected_single_quoted", r"Answer Selected:\s*'{T}'"),
    target("answer_selected_double_quoted", r#"Answer Selected:\s*"{T}""#),
    target("answer", r"Answer:\s*{T}"),
    target("answer_parenthesized", r"Answer:\s*\({T}\)"),
    target("answer_double_quoted", r#"Answer:\s*"{T}""#),
    target("answer_single_quoted", r"Answer:\s*'{T}'"),
    target("answer_bold", r"\*\*\s*Answer\s*:?[*\s]*{T}"),
    target("answer_tag", r"<answer>{T}</answer>"),
    // Fuzzy fallbacks
    target("alone_on_line", r"^{T}$"),
    target("bold", r"\*\*{T}\*\*"),
    target("bold_parenthesized", r"\*\*\({T}\)\*\*"),
    target("parenthesized", r"\({T}\)"),
];
