//! Field length limits shared by request validation and the database schema.

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const EMAIL_MAX_LEN: usize = 120;
pub const PASSWORD_MIN_LEN: usize = 6;

pub const AD_TITLE_MAX_LEN: usize = 100;
pub const AD_DESCRIPTION_MAX_LEN: usize = 5000;
pub const AD_CATEGORY_MAX_LEN: usize = 50;
pub const AD_LOCATION_MAX_LEN: usize = 100;

pub const PROFILE_NAME_MAX_LEN: usize = 50;
pub const PHONE_MAX_LEN: usize = 30;

/// Display name shown as the seller of an ad: "first last", or the
/// username when both name fields are blank.
pub fn seller_display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        username.to_string()
    } else {
        full.to_string()
    }
}
