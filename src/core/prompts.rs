//! Prompt template registry

use crate::core::errors::{Result, TranslationError};
use crate::core::models::Conversation;

/// Name of the translation task
pub const TRANSLATION_TASK: &str = "Traducción";

/// Source language used by the translation task when none is given
pub const DEFAULT_PROMPT_SOURCE_LANG: &str = "inglés";

/// Target language used by the translation task when none is given
pub const DEFAULT_PROMPT_TARGET_LANG: &str = "español";

/// Languages offered for prompt-driven tasks
pub const AVAILABLE_LANGUAGES: &[&str] = &[
    "español",
    "inglés",
    "francés",
    "alemán",
    "italiano",
    "portugués",
    "chino",
    "japonés",
];

const DEFAULT_TASKS: &[(&str, &str, &str)] = &[
    (
        TRANSLATION_TASK,
        "Eres un traductor profesional. Tu tarea es traducir el texto del usuario del idioma de origen al idioma destino solicitado. Proporciona SOLO la traducción, sin explicaciones adicionales.",
        "Traduce el siguiente texto de {source_lang} a {target_lang}:\n\n{text}",
    ),
    (
        "Resumen",
        "Eres un asistente experto en resumir textos. Proporciona resúmenes concisos y precisos que capturen las ideas principales.",
        "Resume el siguiente texto de manera concisa:\n\n{text}",
    ),
    (
        "VQA",
        "Eres un experto en interpretación visual. Responde preguntas sobre una imagen de forma breve, directa y basada SOLO en lo visible. Si la pregunta no puede responderse con la imagen, di claramente \"No se puede determinar con la imagen\".",
        "Pregunta sobre la imagen: {text}. Responde en español.",
    ),
];

/// A named prompting pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPrompt {
    pub task_name: String,
    pub system_instruction: String,
    pub user_template: String,
}

impl TaskPrompt {
    fn is_translation(&self) -> bool {
        self.task_name == TRANSLATION_TASK
    }

    /// Languages the task actually uses: the given ones with inglés → español
    /// filled in for the translation task, `None` for tasks without languages.
    pub fn languages<'a>(
        &self,
        source_lang: Option<&'a str>,
        target_lang: Option<&'a str>,
    ) -> Option<(&'a str, &'a str)> {
        if !self.is_translation() {
            return None;
        }

        Some((
            non_empty(source_lang).unwrap_or(DEFAULT_PROMPT_SOURCE_LANG),
            non_empty(target_lang).unwrap_or(DEFAULT_PROMPT_TARGET_LANG),
        ))
    }
}

/// Immutable set of task prompts, in registration order
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    tasks: Vec<TaskPrompt>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new(
            DEFAULT_TASKS
                .iter()
                .map(|(name, system, template)| TaskPrompt {
                    task_name: name.to_string(),
                    system_instruction: system.to_string(),
                    user_template: template.to_string(),
                })
                .collect(),
        )
    }
}

impl PromptRegistry {
    pub fn new(tasks: Vec<TaskPrompt>) -> Self {
        Self { tasks }
    }

    pub fn get(&self, task_name: &str) -> Option<&TaskPrompt> {
        self.tasks.iter().find(|t| t.task_name == task_name)
    }

    pub fn get_all_tasks(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.task_name.clone()).collect()
    }

    /// Build the system + user conversation for `task_name`.
    ///
    /// Languages only take part in the translation task, where missing or
    /// empty values fall back to inglés → español. The text is inserted
    /// verbatim.
    pub fn format_prompt(
        &self,
        task_name: &str,
        text: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
    ) -> Result<Conversation> {
        let task = self.get(task_name).ok_or_else(|| TranslationError::UnknownTask {
            task: task_name.to_string(),
        })?;

        let user_message = match task.languages(source_lang, target_lang) {
            Some((source_lang, target_lang)) => interpolate(
                &task.user_template,
                &[
                    ("source_lang", source_lang),
                    ("target_lang", target_lang),
                    ("text", text),
                ],
            ),
            None => interpolate(&task.user_template, &[("text", text)]),
        };

        Ok(Conversation::new(task.system_instruction.clone(), user_message))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Replace `{name}` placeholders in a single pass, so braces inside the
/// substituted values are never expanded again.
fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let replaced = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });

        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
