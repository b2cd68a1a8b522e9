use crate::ciflow::labels::LabelPolicy;

/// A comment that can be posted to a pull request.
#[derive(Debug)]
pub struct Comment {
    text: String,
}

impl Comment {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn render(&self) -> &str {
        &self.text
    }
}

/// Guidance posted when a trigger label that is not supported is added to a PR.
pub fn unsupported_label_comment(label: &str, policy: &LabelPolicy) -> Comment {
    let mut text = match policy.retired_note(label) {
        Some(note) => note.trim_end().to_string(),
        None => format!(
            "We have recently simplified the CIFlow labels and `{label}` is no longer in use."
        ),
    };
    text.push_str("\nYou can use any of the following\n");
    for label in policy.actionable_labels() {
        let line = match &label.description {
            Some(description) => format!("- `{}`: {description}\n", label.name),
            None => format!("- `{}`\n", label.name),
        };
        text.push_str(&line);
    }
    Comment::new(text)
}
