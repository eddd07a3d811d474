use crate::answers::AnswerMode;

use super::Question;

const REDO_PREAMBLE: &str = "I am having trouble figuring out which of the options you meant. \
Could you please try again, selecting from the values given so that I can better figure out \
which one you mean. Again, it works best if you say something like \"Answer: X\". \
Thanks, that will help me understand you!";

/// Question text followed by its options, sorted by code.
pub fn build_question(question: &Question) -> String {
    let mut options: Vec<_> = question.options.iter().collect();
    options.sort_by_key(|o| o.code);

    let mut lines = vec![question.prompt_text.clone(), String::new()];
    lines.extend(options.iter().map(|o| format!("({}) {}", o.code, o.text)));
    lines.join("\n")
}

fn answer_instruction(question: &Question) -> Option<&'static str> {
    match question.mode {
        AnswerMode::Free | AnswerMode::Ignore => None,
        AnswerMode::Number => Some(
            "Answer with a number. To make sure I am getting your final answer correct, \
             say something like 'Answer: #' where # is the number you'd like to indicate.",
        ),
        AnswerMode::Word => Some(
            "Answer with a single word. To make sure I am getting your final answer correct, \
             say something like 'Answer: WORD' where WORD is the answer you'd like to give.",
        ),
        AnswerMode::Line => Some(
            "Answer with a single line. To make sure I am getting your final answer correct, \
             say something like 'Answer: RESPONSE' where RESPONSE is the answer you'd like to give.",
        ),
        AnswerMode::Date => Some(
            "Answer with a single date. To make sure I am getting your final answer correct, \
             say something like 'Answer: DATE' where DATE is the answer you'd like to give. \
             Write DATE in the form YYYY-MM-DD.",
        ),
        AnswerMode::Multi => Some(
            "To make sure I am getting your final answer correct, say something like 'Answer: X' \
             where X is your choice or choices from the list. You can select one or more answers \
             from the list but limit it to just the answers you think are important. If you need \
             to select more than one answer, separate them by dashes (e.g., Answer: 20-31-57)",
        ),
        AnswerMode::Single => Some(
            "To make sure I am getting your final answer correct, say something like 'Answer: X' \
             where X is the choice you have made. Select only one answer. Just type the number \
             you want to select.",
        ),
    }
}

/// Full prompt for one question. `redo` asks again after an unreadable reply.
pub fn build_prompt(question: &Question, redo: bool) -> String {
    let mut prompt = String::new();
    if redo {
        prompt.push_str(REDO_PREAMBLE);
        prompt.push_str("\n\n");
    }
    prompt.push_str(&build_question(question));
    prompt.push_str("\n\n");
    if let Some(instruction) = answer_instruction(question) {
        prompt.push_str(instruction);
    }
    prompt
}

/// Short single-line rendering for log output.
pub fn truncate_for_log(text: &str, max_len: usize) -> String {
    let mut truncated: String = text.chars().take(max_len).collect();
    if text.chars().nth(max_len).is_some() {
        truncated.push_str("...");
    }
    truncated.replace(['[', '\n'], " ")
}
