//! Writes quiz artifacts to disk: `.bquiz` JSON documents, self-contained
//! HTML pages, and the setup tutorial shown when no platform is available.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::errors::{AppError, AppResult};
use crate::models::domain::QuizDocument;
use crate::models::dto::OutputFormat;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>__TITLE__</title>
  <style>
    body { font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; color: #333; }
    h1 { color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; }
    .question { background-color: #f9f9f9; border-left: 4px solid #3498db; padding: 15px; margin: 20px 0; border-radius: 4px; }
    .option { display: block; margin: 6px 0; }
    .explanation { background-color: #fffacd; border-left: 4px solid #f1c40f; padding: 10px; margin-top: 10px; display: none; }
    .reveal { background-color: #3498db; color: white; border: none; padding: 8px 12px; border-radius: 4px; cursor: pointer; margin-top: 10px; }
    pre { background-color: #f0f0f0; padding: 10px; border-radius: 3px; overflow-x: auto; }
    #microcourse { white-space: pre-wrap; background-color: #f9f9f9; padding: 15px; border-radius: 4px; }
  </style>
</head>
<body>
  <h1>__TITLE__</h1>
  <div id="microcourse"></div>
  <div id="questions"></div>
  <script>
    const quiz = __QUIZ_JSON__;

    const courseEl = document.getElementById("microcourse");
    if (quiz.microcourse) {
      courseEl.textContent = quiz.microcourse;
    } else {
      courseEl.remove();
    }

    const container = document.getElementById("questions");
    quiz.questions.forEach((q, index) => {
      const card = document.createElement("div");
      card.className = "question";

      const title = document.createElement("h3");
      title.textContent = (index + 1) + ". " + q.question;
      card.appendChild(title);

      if (q.type === "multiple_choice") {
        q.options.forEach(option => {
          const label = document.createElement("span");
          label.className = "option";
          label.textContent = option;
          card.appendChild(label);
        });
      } else if (q.type === "true_false") {
        ["True", "False"].forEach(option => {
          const label = document.createElement("span");
          label.className = "option";
          label.textContent = option;
          card.appendChild(label);
        });
      }

      const explanation = document.createElement("div");
      explanation.className = "explanation";
      explanation.textContent = "Answer: " + q.correct_answer + " — " + q.explanation;

      const reveal = document.createElement("button");
      reveal.className = "reveal";
      reveal.textContent = "Show answer";
      reveal.addEventListener("click", () => {
        explanation.style.display = "block";
      });

      card.appendChild(reveal);
      card.appendChild(explanation);
      container.appendChild(card);
    });
  </script>
</body>
</html>
"#;

const SETUP_TUTORIAL_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Quiz Generator - Model Setup Tutorial</title>
  <style>
    body { font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; color: #333; }
    h1 { color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; }
    h2 { color: #2980b9; margin-top: 30px; }
    .card { background-color: #f9f9f9; border-left: 4px solid #3498db; padding: 15px; margin: 20px 0; border-radius: 4px; }
    code { background-color: #f0f0f0; padding: 2px 5px; border-radius: 3px; font-family: monospace; }
    .note { background-color: #fffacd; border-left: 4px solid #f1c40f; padding: 15px; margin: 20px 0; border-radius: 4px; }
  </style>
</head>
<body>
  <h1>Model Setup Tutorial</h1>

  <div class="card">
    <p>To generate quizzes, you need to set up at least one of the following:</p>
    <ul>
      <li>An API key for a cloud-based LLM service (Anthropic, OpenAI, OpenRouter, or GROQ)</li>
      <li>Ollama installed on your computer with at least one model</li>
    </ul>
  </div>

  <h2>Option 1: Set up a cloud-based LLM service</h2>
  <p>Create an API key with one of the supported services and export the
  matching environment variable before starting the server:</p>
  <ul>
    <li>Anthropic: <code>ANTHROPIC_API_KEY</code> (console.anthropic.com)</li>
    <li>OpenAI: <code>OPENAI_API_KEY</code> (platform.openai.com)</li>
    <li>OpenRouter: <code>OPENROUTER_API_KEY</code> (openrouter.ai)</li>
    <li>GROQ: <code>GROQ_API_KEY</code> (console.groq.com)</li>
  </ul>

  <div class="note">
    <p><strong>Note:</strong> On macOS/Linux:</p>
    <code>export ANTHROPIC_API_KEY="your-api-key"</code>
    <p>Add this to your <code>.bashrc</code> or <code>.zshrc</code> file to make it permanent.</p>
  </div>

  <h2>Option 2: Set up Ollama (Local LLM)</h2>
  <ol>
    <li>Download and install Ollama from ollama.ai</li>
    <li>Open a terminal and run: <code>ollama pull qwen2.5:3b</code> (or another model of your choice)</li>
    <li>Make sure the Ollama service is running</li>
  </ol>

  <h2>Next Steps</h2>
  <p>After setting up at least one of the options above, try generating a quiz
  again. If you continue to have issues, please check the server logs.</p>
</body>
</html>
"#;

/// Replaces characters that are invalid in filenames with underscores.
pub fn sanitize_filename(text: &str) -> String {
    const INVALID: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    text.chars()
        .map(|c| if INVALID.contains(&c) { '_' } else { c })
        .collect()
}

pub struct OutputService {
    output_dir: PathBuf,
}

impl OutputService {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Writes the quiz in the requested format and returns the file path.
    pub fn write_quiz(&self, quiz: &QuizDocument, format: OutputFormat) -> AppResult<String> {
        match format {
            OutputFormat::Bquiz => self.write_bquiz(quiz),
            OutputFormat::Html => self.write_html(quiz),
        }
    }

    fn write_bquiz(&self, quiz: &QuizDocument) -> AppResult<String> {
        let path = self.artifact_path(&quiz.topic, quiz.subtopic.as_deref(), "bquiz");
        let body = serde_json::to_string_pretty(quiz)?;
        self.write_file(&path, &body)
    }

    fn write_html(&self, quiz: &QuizDocument) -> AppResult<String> {
        let path = self.artifact_path(&quiz.topic, quiz.subtopic.as_deref(), "html");
        let quiz_json = serde_json::to_string(quiz)?;
        let body = HTML_TEMPLATE
            .replace("__TITLE__", &html_escape(&quiz.name))
            .replace("__QUIZ_JSON__", &quiz_json);
        self.write_file(&path, &body)
    }

    /// Written when resolution comes back unavailable; replaces the quiz.
    pub fn write_setup_tutorial(&self) -> AppResult<String> {
        let filename = format!(
            "model_setup_tutorial_{}.html",
            Utc::now().format("%Y%m%d%H%M%S")
        );
        let path = self.output_dir.join(filename);
        self.write_file(&path, SETUP_TUTORIAL_HTML)
    }

    fn artifact_path(&self, topic: &str, subtopic: Option<&str>, extension: &str) -> PathBuf {
        let mut stem = sanitize_filename(topic).replace(' ', "_").to_lowercase();
        if let Some(subtopic) = subtopic {
            stem.push('_');
            stem.push_str(&sanitize_filename(subtopic).replace(' ', "_").to_lowercase());
        }
        let filename = format!(
            "{}_{}.{}",
            stem,
            Utc::now().format("%Y%m%d%H%M%S"),
            extension
        );
        self.output_dir.join(filename)
    }

    fn write_file(&self, path: &Path, body: &str) -> AppResult<String> {
        fs::create_dir_all(&self.output_dir)?;
        fs::write(path, body)?;

        let path = path
            .to_str()
            .ok_or_else(|| AppError::OutputError("output path is not valid UTF-8".to_string()))?
            .to_string();
        log::info!("Wrote quiz artifact to {}", path);
        Ok(path)
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
