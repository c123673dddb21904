pub fn render_password_reset(reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Reset your password</h2>
    <p>Someone asked to reset the password for your TailTrack account.</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #2f855a; color: white; text-decoration: none; border-radius: 4px;">Choose a new password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 1 hour. If you didn't ask for this, you can ignore it and your password stays the same.</p>
</body>
</html>"#
    )
}

pub fn render_password_reset_text(reset_url: &str) -> String {
    format!(
        "Someone asked to reset the password for your TailTrack account.\n\n\
         Choose a new password: {reset_url}\n\n\
         This link expires in 1 hour. If you didn't ask for this, you can ignore it."
    )
}
