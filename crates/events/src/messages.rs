//! Email templates.

use crate::dispatch::OutboundEmail;

/// Subject line of the verification email.
pub const VERIFICATION_SUBJECT: &str = "Confirm your email address";

/// Render the account verification email for `username`.
///
/// `verify_url` is the absolute `/auth/verify-email/<token>` link.
pub fn verification_email(to: &str, username: &str, verify_url: &str) -> OutboundEmail {
    let username = html_escape::encode_text(username);
    let href = html_escape::encode_double_quoted_attribute(verify_url);
    let link_text = html_escape::encode_text(verify_url);
    let html_body = format!(
        "<p>Hello {username},</p>\
         <p>Thanks for registering. Please confirm your email address by \
         following the link below:</p>\
         <p><a href=\"{href}\">{link_text}</a></p>\
         <p>The link is valid for one hour. If you did not create an account, \
         you can ignore this message.</p>"
    );
    OutboundEmail {
        to: to.to_string(),
        subject: VERIFICATION_SUBJECT.to_string(),
        html_body,
    }
}
