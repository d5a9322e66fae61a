use crate::auth::repo_types::User;

pub const RESET_PASSWORD_SUBJECT: &str = "[RSU Shipment] Reset Your Password";

pub struct RenderedMail {
    pub text: String,
    pub html: String,
}

pub fn reset_password(user: &User, link: &str) -> RenderedMail {
    let text = format!(
        "Dear {email},\n\
        \n\
        To reset your password click on the following link:\n\
        \n\
        {link}\n\
        \n\
        If you have not requested a password reset simply ignore this message.\n\
        \n\
        Sincerely,\n\
        \n\
        The RSU Shipment Team\n",
        email = user.email,
    );
    let html = format!(
        "<p>Dear {email},</p>\n\
        <p>To reset your password <a href=\"{link}\">click here</a>.</p>\n\
        <p>Alternatively, you can paste the following link in your browser's address bar:</p>\n\
        <p>{link}</p>\n\
        <p>If you have not requested a password reset simply ignore this message.</p>\n\
        <p>Sincerely,</p>\n\
        <p>The RSU Shipment Team</p>\n",
        email = escape_html(&user.email),
        link = escape_html(link),
    );
    RenderedMail { text, html }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_user;

    #[test]
    fn reset_mail_contains_link_in_both_bodies() {
        let link = "https://rsu.example/reset_password/abc.def.ghi";
        let mail = reset_password(&sample_user(1, "jane@rsu.example"), link);
        assert!(mail.text.contains(link));
        assert!(mail.html.contains(link));
        assert!(mail.text.starts_with("Dear jane@rsu.example"));
    }

    #[test]
    fn html_body_escapes_markup() {
        let mail = reset_password(&sample_user(1, "<b>x</b>@rsu.example"), "https://x/?a=1&b=2");
        assert!(mail.html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(mail.html.contains("a=1&amp;b=2"));
    }
}
