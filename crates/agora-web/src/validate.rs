//! Form validation, run before any request leaves for the backend. The
//! backend validates again; these checks only exist to fail fast and render
//! field-level messages without a round trip.

/// A failed field with its user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

pub fn validate_thread(title: &str, content: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let title = title.trim();
    let content = content.trim();

    if title.chars().count() < 5 {
        errors.push(FieldError::new("title", "Title must be at least 5 characters"));
    } else if title.chars().count() > 200 {
        errors.push(FieldError::new("title", "Title must be at most 200 characters"));
    }
    if content.chars().count() < 10 {
        errors.push(FieldError::new("content", "Content must be at least 10 characters"));
    }
    errors
}

pub fn validate_reply(content: &str) -> Vec<FieldError> {
    if content.trim().is_empty() {
        vec![FieldError::new("content", "Reply cannot be empty")]
    } else {
        Vec::new()
    }
}

pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let username = username.trim();

    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        errors.push(FieldError::new("username", "Username must be 3 to 32 characters"));
    }
    if !looks_like_email(email.trim()) {
        errors.push(FieldError::new("email", "Enter a valid email address"));
    }
    if password.chars().count() < 8 {
        errors.push(FieldError::new("password", "Password must be at least 8 characters"));
    }
    if password != confirm {
        errors.push(FieldError::new("confirm", "Passwords do not match"));
    }
    errors
}

/// Coarse shape check; the backend owns real address validation.
fn looks_like_email(s: &str) -> bool {
    let Some(at) = s.find('@') else { return false };
    let (local, domain) = s.split_at(at);
    let domain = &domain[1..];
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_title_is_rejected_with_the_exact_message() {
        let errors = validate_thread("abcd", "long enough content here");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[0].message, "Title must be at least 5 characters");
    }

    #[test]
    fn title_length_is_measured_in_characters_not_bytes() {
        // Five multibyte characters pass the minimum
        assert!(validate_thread("ééééé", "long enough content here").is_empty());
    }

    #[test]
    fn overlong_title_and_short_content_both_report() {
        let title = "x".repeat(201);
        let errors = validate_thread(&title, "short");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[1].field, "content");
    }

    #[test]
    fn whitespace_only_reply_is_empty() {
        assert!(!validate_reply("   \n ").is_empty());
        assert!(validate_reply("hello").is_empty());
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration("ada", "ada@example.com", "password1", "password1")
            .is_empty());

        let errors = validate_registration("ab", "not-an-email", "short", "different");
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "email", "password", "confirm"]);
    }

    #[test]
    fn email_shape_requires_domain_with_a_dot() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a@.co"));
        assert!(!looks_like_email("a@b.co."));
    }
}
