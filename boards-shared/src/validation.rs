//! Input validation helpers shared by the workflows

use validator::ValidateEmail;

/// Maximum username length
pub const USERNAME_MAX_LENGTH: usize = 30;

/// Maximum email length
pub const EMAIL_MAX_LENGTH: usize = 254;

pub const INVALID_USERNAME: &str = "Invalid username.";
pub const USERNAME_EXISTS: &str = "Username already exists.";
pub const EMAIL_EXISTS: &str = "Email already exists.";

/// Slug used when an account name has no usable characters
const FALLBACK_SLUG: &str = "account";

/// Whether `value` is a syntactically valid email address
pub fn is_email(value: &str) -> bool {
    value.validate_email()
}

/// Syntactic username checks; uniqueness is checked against the store
///
/// Usernames are compared lowercased, and an email-shaped username is
/// rejected so signin by username can never be confused with an email.
pub fn check_username_shape(username: &str) -> Result<(), String> {
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            USERNAME_MAX_LENGTH
        ));
    }

    if is_email(&username.to_lowercase()) {
        return Err(INVALID_USERNAME.to_string());
    }

    Ok(())
}

/// Derives a URL slug from a name
///
/// Lowercases, keeps ASCII letters and digits, and collapses every other run
/// of characters into one hyphen.
///
/// ```
/// use boards_shared::validation::slugify;
///
/// assert_eq!(slugify("Pueblo Co."), "pueblo-co");
/// assert_eq!(slugify("juan"), "juan");
/// assert_eq!(slugify("!!!"), "account");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// The `n`th candidate slug for a base: `base`, `base-2`, `base-3`, ...
pub fn slug_candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_email() {
        assert!(is_email("juan@example.com"));
        assert!(!is_email("juan"));
        assert!(!is_email("juan@"));
    }

    #[test]
    fn test_email_shaped_username_is_invalid() {
        assert_eq!(
            check_username_shape("Juan@Example.com"),
            Err(INVALID_USERNAME.to_string())
        );
        assert!(check_username_shape("juan").is_ok());
    }

    #[test]
    fn test_username_length() {
        assert!(check_username_shape(&"a".repeat(30)).is_ok());
        assert!(check_username_shape(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Juan"), "juan");
        assert_eq!(slugify("  Pueblo   Co. "), "pueblo-co");
        assert_eq!(slugify("a_b-c"), "a-b-c");
        assert_eq!(slugify("ñ"), "account");
    }

    #[test]
    fn test_slug_candidate() {
        assert_eq!(slug_candidate("juan", 1), "juan");
        assert_eq!(slug_candidate("juan", 2), "juan-2");
        assert_eq!(slug_candidate("juan", 3), "juan-3");
    }
}
