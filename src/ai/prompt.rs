//! Prompt Builder
//!
//! Consistent prompt layout for every model call the pipeline makes:
//! role, numbered objectives, ordered context, free sections, rules, and a
//! fenced JSON payload.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    Role { expertise: String, task: String },
    Objectives(Vec<String>),
    /// Ordered key/value pairs
    Context(Vec<(String, String)>),
    Text {
        header: Option<String>,
        content: String,
    },
    Code { language: String, content: String },
    /// Hard constraints the response must respect
    Rules(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives<S: AsRef<str>>(mut self, objectives: &[S]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|s| s.as_ref().to_string()).collect(),
        ));
        self
    }

    /// Append to the context block, creating it on first use
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let entry = (key.to_string(), value.to_string());
        for section in &mut self.sections {
            if let PromptSection::Context(ctx) = section {
                ctx.push(entry);
                return self;
            }
        }
        self.sections.push(PromptSection::Context(vec![entry]));
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn rules<S: AsRef<str>>(mut self, rules: &[S]) -> Self {
        self.sections.push(PromptSection::Rules(
            rules.iter().map(|s| s.as_ref().to_string()).collect(),
        ));
        self
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(ctx) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in ctx {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("<RULES>\n");
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push_str("</RULES>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("curriculum designer", "grade 3 math worksheets")
            .objectives(&["Write questions", "Provide answers"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("curriculum designer"));
        assert!(prompt.contains("1. Write questions"));
        assert!(prompt.contains("2. Provide answers"));
    }

    #[test]
    fn test_context_keeps_insertion_order() {
        let prompt = PromptBuilder::new()
            .context_item("Grade", "3")
            .context_item("Subject", "Math")
            .build();

        let grade = prompt.find("**Grade**: 3").unwrap();
        let subject = prompt.find("**Subject**: Math").unwrap();
        assert!(grade < subject);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_rules_and_code() {
        let prompt = PromptBuilder::new()
            .rules(&["Respond with JSON only"])
            .code("json", "{}")
            .build();

        assert!(prompt.contains("<RULES>\n- Respond with JSON only"));
        assert!(prompt.ends_with("```json\n{}\n```"));
    }
}
