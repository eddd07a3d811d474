//! Persona priming from a human respondent's earlier answers.
//!
//! A hint replays one person's demographic answers to the model before the
//! quiz starts, so the model answers as that person. Reading the responses
//! file is left to the caller; these functions only render and place text.

use std::collections::HashMap;

use super::Question;

/// Separator placed between the context block and the first question.
pub const CONTEXT_SEPARATOR: &str = "\n====================\n\n";

const RULE_LEN: usize = 100;

const HINT_INTRO: &str = "To give you a sense of who you are, in the past you have answered \
some demographics questions like this:\n";

const HINT_OUTRO: &str = "When I ask you questions like the above, you should answer in similar \
ways, because this reflects who you are. You are the person who would answer the above questions \
like this. You should reflect that when answering similar questions.";

/// Render one respondent's hint block.
///
/// `questions` are the hinted questions in the order they should appear;
/// `answers` maps question name to the stored answer (comma-separated codes
/// for choice questions, free text otherwise). A missing or blank answer is
/// rendered as unanswered.
pub fn build_hint(questions: &[Question], answers: &HashMap<String, String>) -> String {
    let heavy = "=".repeat(RULE_LEN);
    let light = "-".repeat(RULE_LEN);

    let mut parts = vec![format!("{heavy}\n{HINT_INTRO}")];

    for (i, question) in questions.iter().enumerate() {
        if i > 0 {
            parts.push(format!("{light}\n\n"));
        }
        parts.push(format!("Question: {}\n", question.prompt_text));
        for option in &question.options {
            parts.push(format!("  ({}): {}\n", option.code, option.text));
        }

        let answer = answers.get(&question.name).map(|a| a.trim()).unwrap_or("");
        parts.push(render_answer(question, answer));
    }

    parts.push(format!("{heavy}\n"));
    parts.push(HINT_OUTRO.to_string());
    parts.push("\n\n".to_string());
    parts.join("\n")
}

fn render_answer(question: &Question, answer: &str) -> String {
    if question.options.is_empty() {
        let answer = if answer.is_empty() { "No answer" } else { answer };
        return format!("Your answer: {answer}\n");
    }
    if answer.is_empty() {
        return "You did not answer\n".to_string();
    }

    let responses: Vec<String> = answer
        .split(',')
        .map(str::trim)
        .map(|code| {
            question
                .options
                .iter()
                .find(|o| o.code.to_string() == code)
                .map(|o| format!("({}): {}\n", o.code, o.text))
                // codes the question does not know are repeated as given
                .unwrap_or_else(|| code.to_string())
        })
        .collect();

    match responses.as_slice() {
        [single] => format!("You answered {single}"),
        many => format!("You answered {}\n", many.join(",")),
    }
}

/// Hint for quiz number `index`, cycling through the respondents.
pub fn pick_hint(hints: &[String], index: usize) -> Option<&str> {
    if hints.is_empty() {
        return None;
    }
    Some(hints[index % hints.len()].as_str())
}

/// Put `parts` (setup text, hint, consent, ...) in front of the first
/// question's prompt, joined by newlines and closed by [`CONTEXT_SEPARATOR`].
///
/// Does nothing when there are no questions or no parts.
pub fn prepend_context<S: AsRef<str>>(questions: &mut [Question], parts: &[S]) {
    let Some(first) = questions.first_mut() else {
        return;
    };
    if parts.is_empty() {
        return;
    }

    let context = parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    first.prompt_text = format!("{context}{CONTEXT_SEPARATOR}{}", first.prompt_text);
    tracing::debug!(question = %first.name, chars = context.len(), "Context prepended");
}
