//! Form binding and validation for posts.
//!
//! Binding is a single step: raw submitted fields are copied onto a post and
//! checked against the post constraints, producing a [`FormOutcome`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Post;

/// Longest title accepted, in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Raw fields of the post form, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
        }
    }
}

/// Whether the request carried a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    NotSubmitted,
    Submitted(T),
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.values().flatten().map(String::as_str)
    }
}

/// Result of binding a submission onto a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Nothing was submitted; the post is untouched.
    Unsubmitted(Post),
    /// Submitted values were bound and satisfy every constraint.
    Valid(Post),
    /// Submitted values were bound but break at least one constraint.
    Invalid(Post, FormErrors),
}

/// Everything a template needs to draw the post form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub values: PostForm,
    pub errors: FormErrors,
    pub submitted: bool,
}

impl FormOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn post(&self) -> &Post {
        match self {
            Self::Unsubmitted(post) | Self::Valid(post) | Self::Invalid(post, _) => post,
        }
    }

    pub fn into_view(self) -> FormView {
        match self {
            Self::Unsubmitted(post) => FormView {
                values: PostForm::from(&post),
                errors: FormErrors::default(),
                submitted: false,
            },
            Self::Valid(post) => FormView {
                values: PostForm::from(&post),
                errors: FormErrors::default(),
                submitted: true,
            },
            Self::Invalid(post, errors) => FormView {
                values: PostForm::from(&post),
                errors,
                submitted: true,
            },
        }
    }
}

/// Bind a submission onto `post` and validate the result.
///
/// Submitted text is trimmed before it is bound.
pub fn bind(mut post: Post, submission: Submission<PostForm>) -> FormOutcome {
    let form = match submission {
        Submission::NotSubmitted => return FormOutcome::Unsubmitted(post),
        Submission::Submitted(form) => form,
    };

    post.title = form.title.trim().to_owned();
    post.body = form.body.trim().to_owned();

    let errors = validate(&post);
    if errors.is_empty() {
        FormOutcome::Valid(post)
    } else {
        FormOutcome::Invalid(post, errors)
    }
}

fn validate(post: &Post) -> FormErrors {
    let mut errors = FormErrors::default();

    if post.title.is_empty() {
        errors.add("title", "This value should not be blank.");
    } else if post.title.chars().count() > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!("This value is too long. It should have {TITLE_MAX_CHARS} characters or less."),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(title: &str, body: &str) -> Submission<PostForm> {
        Submission::Submitted(PostForm {
            title: title.to_owned(),
            body: body.to_owned(),
        })
    }

    #[test]
    fn not_submitted_leaves_post_untouched() {
        let post = Post::new("Kept", "as is");
        let outcome = bind(post.clone(), Submission::NotSubmitted);
        assert_eq!(outcome, FormOutcome::Unsubmitted(post));
        assert!(!outcome.into_view().submitted);
    }

    #[test]
    fn valid_submission_binds_trimmed_values() {
        let outcome = bind(Post::default(), submitted("  Hello ", "World\n"));
        let FormOutcome::Valid(post) = outcome else {
            panic!("expected a valid outcome");
        };
        assert_eq!(post.title, "Hello");
        assert_eq!(post.body, "World");
    }

    #[test]
    fn blank_title_is_rejected() {
        let outcome = bind(Post::default(), submitted("   ", "body"));
        let FormOutcome::Invalid(post, errors) = outcome else {
            panic!("expected an invalid outcome");
        };
        assert_eq!(post.body, "body");
        assert_eq!(errors.field("title").len(), 1);
        assert!(errors.field("body").is_empty());
    }

    #[test]
    fn overlong_title_is_rejected() {
        let title = "x".repeat(TITLE_MAX_CHARS + 1);
        assert!(!bind(Post::default(), submitted(&title, "")).is_valid());

        let title = "é".repeat(TITLE_MAX_CHARS);
        assert!(bind(Post::default(), submitted(&title, "")).is_valid());
    }

    #[test]
    fn empty_body_is_allowed() {
        assert!(bind(Post::default(), submitted("Title", "")).is_valid());
    }

    #[test]
    fn invalid_view_keeps_submitted_values() {
        let view = bind(Post::new("old", "old"), submitted("", "new body")).into_view();
        assert!(view.submitted);
        assert_eq!(view.values.title, "");
        assert_eq!(view.values.body, "new body");
        assert_eq!(view.errors.messages().count(), 1);
    }
}
