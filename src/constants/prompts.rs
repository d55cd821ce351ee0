use crate::models::domain::{QuestionFocus, QuestionKind};

/// System instruction for question-generation calls.
pub const GENERATOR_SYSTEM_MESSAGE: &str = "You are a quiz question generator. You MUST return ONLY a valid JSON object with no additional text or commentary. Do not review or comment on the question. Your JSON response MUST include ALL fields specified in the prompt, including the explanation field.";

/// System instruction for long-form microcourse calls.
pub const COURSE_SYSTEM_MESSAGE: &str = "You are an educational content creator. You create clear, concise, and informative content in markdown format. Format your response using markdown with proper headings, bullet points, and code blocks where appropriate.";

/// Question stems handed to the model to push it toward varied phrasings.
pub const QUESTION_STEMS: [&str; 20] = [
    "What best explains",
    "Which most accurately describes",
    "What is the primary",
    "How does it relate",
    "What underlying factor is",
    "Which option most effectively",
    "What is most critical",
    "How best can one",
    "Which factor contributes most",
    "What element is most",
    "How can we characterize",
    "Which answer best illustrates",
    "What is the key",
    "Which most directly impacts",
    "What primarily influences",
    "How best explains",
    "Which factor explains",
    "What is the dominant",
    "How would you classify",
    "Which statement most reflects",
];

/// Default prompt used by the connectivity-test endpoint.
pub const DEFAULT_TEST_PROMPT: &str = r#"Create a challenging multiple-choice question about Python Programming (subtopic: Data Structures).

This should be a text-focused question about concepts. Do not include code snippets.

IMPORTANT: DO NOT wrap your JSON response in ```json code blocks. Return the raw JSON object only.

Return ONLY a JSON object with the following structure:
{
    "question": "The question text",
    "options": ["A. Option text", "B. Option text", "C. Option text", "D. Option text"],
    "correct_answer": "The correct option (exactly as it appears in options)",
    "type": "multiple_choice",
    "concept_phrase": "A short 4-5 word phrase describing what this question is about",
    "explanation": "A detailed explanation of why the correct answer is right and why the other options are wrong"
}"#;

fn topic_text(topic: &str, subtopic: Option<&str>) -> String {
    match subtopic {
        Some(subtopic) => format!("{} (subtopic: {})", topic, subtopic),
        None => topic.to_string(),
    }
}

/// Builds the user prompt for one question of the given kind.
pub fn question_prompt(
    kind: QuestionKind,
    topic: &str,
    subtopic: Option<&str>,
    focus: QuestionFocus,
    difficulty: &str,
) -> String {
    match kind {
        QuestionKind::MultipleChoice => multiple_choice_prompt(topic, subtopic, focus, difficulty),
        QuestionKind::TrueFalse => true_false_prompt(topic, subtopic, focus, difficulty),
        QuestionKind::Cloze => cloze_prompt(topic, subtopic, focus, difficulty),
    }
}

fn multiple_choice_prompt(
    topic: &str,
    subtopic: Option<&str>,
    focus: QuestionFocus,
    difficulty: &str,
) -> String {
    let topic_text = topic_text(topic, subtopic);
    let stems = QUESTION_STEMS.join(", ");

    match focus {
        QuestionFocus::Code => format!(
            r#"Create a {difficulty} multiple-choice question about {topic_text} that MUST include code.

CRITICAL REQUIREMENTS:
1. This MUST be a code-focused question but keep the code brief (2 - 5 lines maximum)
2. ALL answer options MUST contain actual code snippets (not just text about code)
3. You MUST specify the programming language being used in the question
4. Code must be properly formatted and indented as it would appear in an IDE
5. ALL code MUST be enclosed in triple backticks with the language specified
6. The code in the option choices should NOT repeat any code that is in the question
7. The option choices must be able to actually answer the question
8. Do NOT give away the answer in the question text

HELPFUL QUESTION STEMS:
You may use these question stems to help generate creative questions by randomly selecting amongst them:
{stems}

FORMATTING INSTRUCTIONS:
- For the question and EACH option, format any code as: ```language
code here
```
- DO NOT use escaped backticks - use regular backticks instead
- DO NOT wrap your JSON response in ```json code blocks

Return ONLY a JSON object with the following structure:
{{
    "question": "The question text with code snippet properly formatted with triple backticks",
    "options": ["A. Option with code", "B. Option with code", "C. Option with code", "D. Option with code"],
    "correct_answer": "The correct option (exactly as it appears in options)",
    "type": "multiple_choice",
    "language": "The programming language of the code (e.g., 'python', 'javascript', 'java', etc.)",
    "concept_phrase": "A short 4-5 word phrase describing what this question is about",
    "explanation": "A detailed explanation of why the correct answer is right and why the other options are wrong"
}}"#
        ),
        QuestionFocus::Text => format!(
            r#"Create a {difficulty} multiple-choice question about {topic_text}.

This should be a text-focused question about concepts. Do not include code snippets.

HELPFUL QUESTION STEMS:
You may use these question stems to help generate creative questions by randomly selecting amongst them:
{stems}

IMPORTANT: DO NOT wrap your JSON response in ```json code blocks. Return the raw JSON object only.

Return ONLY a JSON object with the following structure:
{{
    "question": "The question text",
    "options": ["A. Option text", "B. Option text", "C. Option text", "D. Option text"],
    "correct_answer": "The correct option (exactly as it appears in options)",
    "type": "multiple_choice",
    "concept_phrase": "A short 4-5 word phrase describing what this question is about",
    "explanation": "A detailed explanation of why the correct answer is right and why the other options are wrong"
}}"#
        ),
    }
}

fn true_false_prompt(
    topic: &str,
    subtopic: Option<&str>,
    focus: QuestionFocus,
    difficulty: &str,
) -> String {
    let topic_text = topic_text(topic, subtopic);

    match focus {
        QuestionFocus::Code => format!(
            r#"Create a {difficulty} true/false question about {topic_text} that MUST include code.

IMPORTANT REQUIREMENTS:
1. This MUST be a code-focused question
2. The question MUST contain an actual code snippet (not just mentions of code concepts)
3. You MUST specify the programming language being used in the question
4. Code must be properly formatted and indented as it would appear in an IDE
5. DO NOT use escaped backticks - use regular backticks instead
6. DO NOT wrap your JSON response in ```json code blocks
7. Ask specific true or false questions that focus on where, how, if/then, logic, and complex routines rather than generic definitions

Return ONLY a JSON object with the following structure:
{{
    "question": "The question text with code snippet and language specification",
    "correct_answer": true or false (boolean value),
    "type": "true_false",
    "language": "The programming language of the code (e.g., 'python', 'javascript', 'java', etc.)",
    "concept_phrase": "A short 4-5 word phrase describing what this question is about",
    "explanation": "A detailed explanation of why the answer is true or false"
}}"#
        ),
        QuestionFocus::Text => format!(
            r#"Create a {difficulty} true/false question about {topic_text}.

This should be a text-focused question about concepts. Do not include code snippets.
1. Avoid asking overly broad elementary questions
2. Ask specific true or false questions that focus on where, how, if/then, logic, and complex routines rather than generic definitions

IMPORTANT: DO NOT wrap your JSON response in ```json code blocks. Return the raw JSON object only.

Return ONLY a JSON object with the following structure:
{{
    "question": "The question text",
    "correct_answer": true or false (boolean value),
    "type": "true_false",
    "concept_phrase": "A short 4-5 word phrase describing what this question is about",
    "explanation": "A detailed explanation of why the answer is true or false"
}}"#
        ),
    }
}

fn cloze_prompt(
    topic: &str,
    subtopic: Option<&str>,
    focus: QuestionFocus,
    difficulty: &str,
) -> String {
    let topic_text = topic_text(topic, subtopic);

    match focus {
        QuestionFocus::Code => format!(
            r#"Create a {difficulty} fill-in-the-blank (cloze) question about {topic_text} that MUST include code.

IMPORTANT REQUIREMENTS:
1. This MUST be a code-focused question
2. The question MUST contain an actual code snippet with a blank
3. You MUST specify the programming language being used in the question
4. The blank should be represented by "___" (three underscores) in the code
5. DO NOT use escaped backticks - use regular backticks instead
6. DO NOT wrap your JSON response in ```json code blocks

Return ONLY a JSON object with the following structure:
{{
    "question": "The question text with code snippet containing a blank represented by '___'",
    "correct_answer": "The correct answer that should fill in the blank",
    "type": "cloze",
    "language": "The programming language of the code (e.g., 'python', 'javascript', 'java', etc.)",
    "concept_phrase": "A short 4-5 word phrase describing what this question is about",
    "explanation": "A detailed explanation of the correct answer"
}}"#
        ),
        QuestionFocus::Text => format!(
            r#"Create a {difficulty} fill-in-the-blank (cloze) question about {topic_text}.

This should be a text-focused question about concepts. Do not include code snippets.
The blank should be represented by "___" (three underscores) in the question text.

IMPORTANT: DO NOT wrap your JSON response in ```json code blocks. Return the raw JSON object only.

Return ONLY a JSON object with the following structure:
{{
    "question": "The question text with a blank represented by '___'",
    "correct_answer": "The correct answer that should fill in the blank",
    "type": "cloze",
    "concept_phrase": "A short 4-5 word phrase describing what this question is about",
    "explanation": "A detailed explanation of the correct answer"
}}"#
        ),
    }
}

/// Builds the prompt for the microcourse that precedes the questions.
pub fn microcourse_prompt(topic: &str, subtopic: Option<&str>) -> String {
    let subtopics_text = subtopic.unwrap_or(topic);

    format!(
        r#"Create a comprehensive 400-600 word educational course on {topic}, focusing on the following subtopics: {subtopics_text}.

Format the content using markdown with headings, bullet points, and emphasis where appropriate, but avoid using tables or complex formatting that would be difficult to display.

The content should be:
1. Educational and informative
2. Well-structured with clear headings
3. Between 400-600 words in total

Use this structure:
- Start with a brief introduction to {topic}
- For each subtopic, provide a section with relevant information
- End with a brief conclusion or summary

IMPORTANT FORMATTING GUIDELINES:
- Use ## for main headings and ### for subheadings
- Use bullet points (- or *) for lists
- Use **bold** for emphasis or key terms
- Keep paragraphs relatively short
- DO NOT include tables or complex layouts
- DO NOT include images or non-text elements
- When inserting code, be sure to include the language for the markdown
- IMPORTANT: Never enclose your response in backticks or backticks with the markdown keyword
- IMPORTANT: Always include the ending backticks for code blocks to complete the code block

Provide ONLY the course content in markdown format, without any additional commentary."#
    )
}
