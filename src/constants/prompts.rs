/// Contract string: callers may match on it to detect an ungrounded question.
pub const NOT_IN_CONTEXT_ANSWER: &str = "I could not find the answer in the provided document.";

pub const GENERAL_ANSWER_PROMPT: &str = "Answer this question for a {level} learner:
{query}

Requirements:
{level_guidance}
- Structure the answer with clear sections if needed
- Include examples where appropriate
- Keep the answer concise but thorough";

pub const GROUNDED_ANSWER_PROMPT: &str = "You are a helpful assistant. Answer the following question based ONLY on the provided context.
If the answer is not found in the context, reply with exactly: \"{refusal}\"

Context:
{context}

Question:
{query}

Write the answer for a {level} learner.";

pub const SUMMARY_PROMPT: &str = "Summarize this for a {level} learner:
{context}

Requirements:
{level_guidance}
- Keep under 200 words
- Focus on key concepts";

pub const QUESTION_SCHEMA: &str = r#"{"question": "<question text>", "options": ["<option 1>", "<option 2>", "<option 3>", "<option 4>"], "correct_answer": "<exact text of the correct option>"}"#;

pub const SINGLE_QUESTION_PROMPT: &str = "You are a quiz generator. Write ONE multiple-choice question based only on the content below.

Content:
{context}
{avoid_block}
Rules:
- Exactly 4 distinct options
- correct_answer must be copied exactly from one of the options
- The question must test understanding of the content, not trivia about formatting

Return only valid JSON, with no prose and no markdown, in this exact shape:
{schema}";

pub const AVOID_REPEAT_BLOCK: &str = "
Do not repeat or paraphrase any of these previously asked questions:
{questions}
";

pub const FULL_QUIZ_PROMPT: &str = "You are a quiz generator. Write exactly {count} multiple-choice questions based only on the content below.

Content:
{context}

Rules:
- Exactly {count} questions, each covering a different point of the content
- Each question has exactly 4 distinct options
- correct_answer must be copied exactly from one of that question's options

Return only valid JSON. Your entire reply must be a single JSON array of {count} objects, each in this exact shape:
{schema}";

pub const ANALYSIS_PROMPT: &str = "You are a tutor reviewing a learner's quiz results.

Original material:
{context}

Questions answered correctly:
{correct}

Questions answered incorrectly (JSON):
{incorrect}

Identify the topics the learner has mastered and the topics they should revisit, then give short, encouraging feedback that explains the mistakes.

Return only valid JSON: a single object of the form
{\"strong_areas\": [\"<topic>\", ...], \"weak_areas\": [\"<topic>\", ...], \"feedback\": \"<feedback text>\"}";

pub const BEGINNER_GUIDANCE: &str = "- Use simple language and basic concepts\n- Avoid jargon, or define it the first time it appears";
pub const INTERMEDIATE_GUIDANCE: &str = "- Include more technical details\n- Assume familiarity with the basic vocabulary of the subject";
pub const ADVANCED_GUIDANCE: &str = "- Provide comprehensive explanations with advanced terminology\n- Mention edge cases and deeper connections between concepts";
