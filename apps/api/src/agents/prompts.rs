// Prompt templates for generation requests
//
// Prompts are versioned so the implementation log can name the exact
// template an artifact was produced with.

use std::collections::HashMap;

/// Prompt template structure
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub version: String,
    pub system: String,
    pub user_template: String,
}

impl PromptTemplate {
    /// Render the user template, replacing every `{{name}}` with its variable
    ///
    /// Placeholders without a variable are left in place.
    pub fn render(&self, variables: &HashMap<String, String>) -> String {
        substitute(&self.user_template, variables)
    }

    /// System prompt followed by the rendered user template
    pub fn render_full(&self, variables: &HashMap<String, String>) -> String {
        format!(
            "{}\n\n{}",
            substitute(&self.system, variables),
            self.render(variables)
        )
    }
}

fn substitute(template: &str, variables: &HashMap<String, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                match variables.get(name) {
                    Some(value) => output.push_str(value),
                    None => output.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    output.push_str(rest);
    output
}

pub mod library {
    use super::PromptTemplate;

    pub fn task_execution() -> PromptTemplate {
        PromptTemplate {
            name: "task_execution".to_string(),
            version: "1.1.0".to_string(),
            system: "You are {{agent}}, a specialist in {{capabilities}}. \
                     You are one of several agents building the same project; \
                     stay within your task."
                .to_string(),
            user_template: "Project: {{project}}\n\
                            Task: {{title}}\n\
                            Description: {{description}}\n\
                            Priority: {{priority}}\n\
                            Complexity: {{complexity}}\n\
                            Guidance: {{guidance}}\n\
                            Behavior profile: {{profile}}\n\n\
                            Produce the deliverable for this task."
                .to_string(),
        }
    }

    pub fn conflict_review() -> PromptTemplate {
        PromptTemplate {
            name: "conflict_review".to_string(),
            version: "1.0.0".to_string(),
            system: "You are reviewing concurrent edits made by other agents.".to_string(),
            user_template: "File: {{file}}\n\
                            Agents: {{agents}}\n\
                            Base version:\n{{base}}\n\n\
                            Reply with the single version you accept."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn render_substitutes_known_variables() {
        let template = library::conflict_review();
        let rendered = template.render(&vars(&[
            ("file", "src/lib.rs"),
            ("agents", "Zola, Kofi"),
            ("base", "fn main() {}"),
        ]));

        assert!(rendered.starts_with("File: src/lib.rs\nAgents: Zola, Kofi"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn unknown_and_unterminated_placeholders_are_kept() {
        let values = vars(&[("a", "1")]);
        assert_eq!(substitute("{{a}} {{ b }} {{c", &values), "1 {{ b }} {{c");
        assert_eq!(substitute("no placeholders", &values), "no placeholders");
    }

    #[test]
    fn full_render_includes_system_prompt() {
        let rendered = library::task_execution().render_full(&vars(&[("agent", "Jabari")]));
        assert!(rendered.starts_with("You are Jabari"));
        assert!(rendered.contains("Task: {{title}}"));
    }
}
