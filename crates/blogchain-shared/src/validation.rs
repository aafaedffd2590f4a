//! Stateless field checks applied to inbound actions before they reach the
//! store.
//!
//! Length limits are measured in UTF-8 bytes.

use crate::constants::{
    MAX_AVATAR_URL_LENGTH, MAX_BIO_LENGTH, MAX_COMMENT_LENGTH, MAX_DISPLAY_NAME_LENGTH,
    MAX_WEBSITE_LENGTH, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
};
use crate::error::{BlogError, Result};

fn reject(msg: impl Into<String>) -> BlogError {
    BlogError::InvalidArgument(msg.into())
}

/// 3-20 characters, ASCII letters, digits and underscore.
pub fn validate_username(username: &str) -> Result<()> {
    let len = username.len();
    let charset_ok = username
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) || !charset_ok {
        return Err(reject(
            "invalid username format (3-20 chars, alphanumeric and underscore only)",
        ));
    }
    Ok(())
}

pub fn validate_comment_content(content: &str) -> Result<()> {
    if content.is_empty() {
        return Err(reject("comment content cannot be empty"));
    }
    if content.len() > MAX_COMMENT_LENGTH {
        return Err(reject(format!(
            "comment content too long (max {MAX_COMMENT_LENGTH} characters)"
        )));
    }
    Ok(())
}

/// Display name, bio, avatar URL and website limits shared by profile
/// creation and update.
pub fn validate_profile_fields(
    display_name: &str,
    bio: &str,
    avatar_url: &str,
    website: &str,
) -> Result<()> {
    if display_name.len() > MAX_DISPLAY_NAME_LENGTH {
        return Err(reject(format!(
            "display name too long (max {MAX_DISPLAY_NAME_LENGTH} characters)"
        )));
    }
    if bio.len() > MAX_BIO_LENGTH {
        return Err(reject(format!(
            "bio too long (max {MAX_BIO_LENGTH} characters)"
        )));
    }
    if avatar_url.len() > MAX_AVATAR_URL_LENGTH {
        return Err(reject(format!(
            "avatar URL too long (max {MAX_AVATAR_URL_LENGTH} characters)"
        )));
    }
    if !website.is_empty() {
        if website.len() > MAX_WEBSITE_LENGTH {
            return Err(reject(format!(
                "website URL too long (max {MAX_WEBSITE_LENGTH} characters)"
            )));
        }
        if !is_website_url(website) {
            return Err(reject("invalid website URL format"));
        }
    }
    Ok(())
}

/// Loose URL shape: optional `http(s)://`, a host of `[0-9a-z.-]`, a dot,
/// 2-6 chars of `[a-z.]`, then any run of word chars, spaces, dots, dashes
/// and slashes.
pub fn is_website_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let bytes = rest.as_bytes();

    let is_host = |b: &u8| b.is_ascii_digit() || b.is_ascii_lowercase() || *b == b'.' || *b == b'-';
    let is_tld = |b: &u8| b.is_ascii_lowercase() || *b == b'.';
    let is_path =
        |b: &u8| b.is_ascii_alphanumeric() || matches!(*b, b'_' | b'/' | b' ' | b'.' | b'-');

    (1..bytes.len()).any(|dot| {
        if bytes[dot] != b'.' || !bytes[..dot].iter().all(is_host) {
            return false;
        }
        (2..=6).any(|tld_len| {
            let tld_end = dot + 1 + tld_len;
            tld_end <= bytes.len()
                && bytes[dot + 1..tld_end].iter().all(is_tld)
                && bytes[tld_end..].iter().all(is_path)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("Bob_42").is_ok());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());

        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("dash-name").is_err());
        assert!(validate_username("émile").is_err());
    }

    #[test]
    fn test_comment_content_bounds() {
        assert!(validate_comment_content("hi").is_ok());
        assert!(validate_comment_content(&"x".repeat(5000)).is_ok());
        assert!(validate_comment_content("").is_err());
        assert!(validate_comment_content(&"x".repeat(5001)).is_err());
        // 4000 characters, 8000 bytes
        assert!(validate_comment_content(&"é".repeat(4000)).is_err());
    }

    #[test]
    fn test_website_urls() {
        assert!(is_website_url("example.com"));
        assert!(is_website_url("https://example.com"));
        assert!(is_website_url("http://blog.example.co.uk/path/to page"));
        assert!(is_website_url("https://my-site.io/"));

        assert!(!is_website_url("https://"));
        assert!(!is_website_url("localhost"));
        assert!(!is_website_url("https://Example.com"));
        assert!(!is_website_url("ftp://example.com"));
        assert!(!is_website_url("https://example.com/?q=1"));
        assert!(!is_website_url("https://.com"));
    }

    #[test]
    fn test_profile_field_limits() {
        assert!(validate_profile_fields("Alice", "hello", "", "").is_ok());
        assert!(validate_profile_fields(&"n".repeat(51), "", "", "").is_err());
        assert!(validate_profile_fields(&"é".repeat(26), "", "", "").is_err());
        assert!(validate_profile_fields(&"é".repeat(25), "", "", "").is_ok());
        assert!(validate_profile_fields("", &"b".repeat(501), "", "").is_err());
        assert!(validate_profile_fields("", "", &"a".repeat(501), "").is_err());
        assert!(validate_profile_fields("", "", "", "not a url").is_err());
    }
}
