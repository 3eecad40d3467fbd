//! Prompt assembly for the examiner model.
//!
//! The output is a plain concatenation: scenario, numbered tasks, rubric, the
//! student's response (or a note that it is attached as audio) and the fixed
//! grading instructions. Nothing here is random, so the same case and response
//! always produce the same prompt.

use crate::domain::model::Case;

/// 學生答案放進 prompt 的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptInput<'a> {
    /// 打字作答或本機轉錄後的逐字稿
    Text(&'a str),
    /// 錄音直接附在請求中
    AttachedAudio,
}

pub const RUBRIC_HEADER: &str = "## Rubric Comparison";
pub const CRITICAL_ERRORS_HEADER: &str = "## Critical Errors";
pub const COMMUNICATION_HEADER: &str = "## Communication";
pub const VERDICT_HEADER: &str = "## Verdict";

const EXAMINER_PREAMBLE: &str = "You are an AMC (Australian Medical Council) clinical examiner \
grading a candidate's performance on the station below. Be strict and fair.";

const GRADING_INSTRUCTIONS: &str = "Grade the candidate against the marking rubric only.
1. Compare the response with every rubric point and state which were met, partly met or missed.
2. Check the response for any critical error listed in the rubric. A single critical error means FAIL.
3. Comment on communication: did the candidate use open-ended questions and show empathy?
4. Give an overall verdict of PASS or FAIL.

Format your answer with exactly these section headers, in this order:";

/// 羅馬數字任務編號 (i, ii, iii...)，和紙本考卷一致
pub fn task_label(index: usize) -> String {
    const NUMERALS: [(usize, &str); 9] = [
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut n = index + 1;
    let mut label = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            label.push_str(numeral);
            n -= value;
        }
    }
    label
}

pub fn build_prompt(case: &Case, input: PromptInput<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str(EXAMINER_PREAMBLE);
    prompt.push_str("\n\n### Scenario\n");
    for line in case.headline() {
        prompt.push_str(&line);
        prompt.push('\n');
    }
    prompt.push_str(&case.scenario);
    prompt.push_str("\n\n### Candidate Tasks\n");
    for (index, task) in case.tasks.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", task_label(index), task));
    }

    prompt.push_str("\n### Marking Rubric\n");
    prompt.push_str(&case.full_rubric());
    prompt.push_str("\n\n");

    match input {
        PromptInput::Text(content) => {
            prompt.push_str("### Candidate Response\n");
            prompt.push_str(content);
            prompt.push_str("\n\n");
        }
        PromptInput::AttachedAudio => {
            prompt.push_str("### Candidate Response\n");
            prompt.push_str(
                "The candidate's spoken response is attached as audio. Listen to the whole \
recording and grade what was actually said.\n\n",
            );
        }
    }

    prompt.push_str(GRADING_INSTRUCTIONS);
    for header in [
        RUBRIC_HEADER,
        CRITICAL_ERRORS_HEADER,
        COMMUNICATION_HEADER,
        VERDICT_HEADER,
    ] {
        prompt.push('\n');
        prompt.push_str(header);
    }
    prompt.push('\n');

    prompt
}
