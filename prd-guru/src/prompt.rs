//! Fixed texts exchanged with the model and shown in place of a model reply.

use shared_types::Document;

/// Shown when the gateway call fails for any reason.
pub const APOLOGY_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Shown when the user has neither their own key nor an active subscription.
pub const UPGRADE_REPLY: &str = "AI access requires your own API key or an active subscription. \
Add a key or subscribe in Settings to continue.";

/// Shown when the model's reply was nothing but an update block.
pub const UPDATED_REPLY: &str =
    "I've updated the PRD based on your input. You can see the changes in the preview.";

/// System prompt instructing the model to emit `label`-tagged update blocks.
pub fn system_prompt(label: &str) -> String {
    format!(
        r#"You are an assistant that helps users write Product Requirements Documents (PRDs).

Your job is to:
1. Ask clarifying questions until you understand the product
2. Help the user reason about their requirements
3. Turn the conversation into structured PRD content

Whenever you have content for the document, include a single fenced block in exactly this format:

```{label}
{{
  "title": "Product name",
  "objective": "What the product aims to achieve",
  "description": "Detailed product description",
  "functionalRequirements": "Functional requirements",
  "nonFunctionalRequirements": "Performance, security and scalability requirements",
  "dependencies": "External dependencies and integrations",
  "acceptanceCriteria": "How to verify the product meets its requirements"
}}
```

Only include the fields you have information for. Omit the rest.

Keep replies short and focused, and move the user through the PRD one step at a time."#
    )
}

/// The user content sent to the model: current draft, then the message.
pub fn user_content(document: &Document, message: &str) -> String {
    let snapshot = serde_json::to_string_pretty(document).unwrap_or_else(|_| "{}".to_string());
    format!("Current PRD state:\n{snapshot}\n\nUser message: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::UpdateExtractor;

    #[test]
    fn test_system_prompt_example_block_is_extractable() {
        let prompt = system_prompt("prd-update");
        let extraction = UpdateExtractor::new("prd-update").extract(&prompt);
        let patch = extraction.patch.expect("prompt example should parse");
        assert_eq!(patch.len(), 7);
        assert!(!extraction.display_text.contains("```"));
    }

    #[test]
    fn test_user_content_embeds_draft() {
        let doc = Document {
            title: "Todo".to_string(),
            ..Default::default()
        };
        let content = user_content(&doc, "Add reminders");
        assert!(content.starts_with("Current PRD state:\n{"));
        assert!(content.contains("\"title\": \"Todo\""));
        assert!(content.ends_with("User message: Add reminders"));
    }
}
