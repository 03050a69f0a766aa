use crate::config::GenerationConfig;
use crate::model::message::{ChatMessage, GenerationPrompt};

const CREATE_SYSTEM_PROMPT: &str = "\
You are a world-class Manim CE expert. Your task is to generate EXCLUSIVELY valid Python code for Manim CE animations.
STRICT RULES:
1. ONLY output code between ```python and ``` delimiters
2. NO natural language explanations
3. Use ONLY Text() for text elements
4. Include necessary imports (manim, numpy, math)
5. Class must inherit from Scene
EXAMPLE:
```python
from manim import *

class DemoScene(Scene):
    def construct(self):
        # Your animation code
```";

const EDIT_SYSTEM_PROMPT: &str = "\
You are a world-class Manim CE expert. Your task is to modify existing Manim CE code based on user requests.
STRICT RULES:
1. ONLY output the complete modified code between ```python and ``` delimiters
2. NO natural language explanations
3. Keep the same class structure
4. Implement the requested changes precisely
5. Maintain code quality and syntax
";

/// Builds the conversations sent to the model.
/// Formatting only: no parsing, no networking.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn create(config: &GenerationConfig, description: &str) -> GenerationPrompt {
        GenerationPrompt {
            messages: vec![
                ChatMessage::system(CREATE_SYSTEM_PROMPT),
                ChatMessage::user(description),
            ],
            temperature: config.temperature,
            max_tokens: config.create_max_tokens,
        }
    }

    /// The current source goes in verbatim; the model must answer with the
    /// whole modified file, not a diff.
    pub fn edit(config: &GenerationConfig, current_code: &str, changes: &str) -> GenerationPrompt {
        let mut content = String::new();

        content.push_str("Code of current animation:\n\n");
        content.push_str(current_code);
        content.push_str("\n\nRequested changes:\n\n");
        content.push_str(changes);
        content.push_str(
            "\n\nModify the existing code to implement the requested changes. \
             ONLY output the complete modified code between ```python and ``` delimiters with NO explanations.",
        );

        GenerationPrompt {
            messages: vec![ChatMessage::system(EDIT_SYSTEM_PROMPT), ChatMessage::user(content)],
            temperature: config.temperature,
            max_tokens: config.edit_max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Role;

    #[test]
    fn create_wraps_description_with_strict_rules() {
        let config = GenerationConfig::default();
        let prompt = PromptBuilder::create(&config, "rotating red square");

        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert!(prompt.messages[0].content.contains("Use ONLY Text()"));
        assert!(prompt.messages[0].content.contains("Class must inherit from Scene"));
        assert_eq!(prompt.messages[1].role, Role::User);
        assert_eq!(prompt.messages[1].content, "rotating red square");
        assert_eq!(prompt.max_tokens, 1000);
        assert!((prompt.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn edit_embeds_full_code_before_changes() {
        let config = GenerationConfig::default();
        let code = "from manim import *\n\nclass DemoScene(Scene):\n    def construct(self):\n        self.play(Create(Square()))";
        let prompt = PromptBuilder::edit(&config, code, "make it blue");

        let user = &prompt.messages[1].content;
        let code_at = user.find(code).expect("code is embedded verbatim");
        let changes_at = user.find("make it blue").expect("changes are embedded");
        assert!(code_at < changes_at);
        assert!(user.contains("complete modified code"));
        assert!(prompt.messages[0].content.contains("Keep the same class structure"));
        assert_eq!(prompt.max_tokens, 1200);
    }
}
