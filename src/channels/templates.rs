//! Message bodies for the activation link.

use super::Notification;

/// Plain-text body for WhatsApp and SMS.
pub fn activation_text(n: &Notification) -> String {
    format!(
        "Hi {owner}! Thanks for registering {business} with Global Call Partners.\n\n\
         To activate your AI assistant, connect your WhatsApp Business account here:\n{link}\n\n\
         This link is personal, please don't share it.",
        owner = n.owner_name,
        business = n.business_name,
        link = n.link,
    )
}

pub fn activation_subject(n: &Notification) -> String {
    format!("Activate the WhatsApp integration for {}", n.business_name)
}

/// HTML body for the activation email.
pub fn activation_html(n: &Notification) -> String {
    let owner = escape_html(&n.owner_name);
    let business = escape_html(&n.business_name);
    let link = escape_html(&n.link);

    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #222; max-width: 560px; margin: 0 auto;">
    <h2>Welcome, {owner}!</h2>
    <p>Thanks for registering <strong>{business}</strong> with Global Call Partners.</p>
    <p>To activate your AI assistant, connect your WhatsApp Business account:</p>
    <p style="text-align: center; margin: 32px 0;">
      <a href="{link}" style="background: #25D366; color: #fff; padding: 12px 24px; border-radius: 6px; text-decoration: none;">Connect WhatsApp</a>
    </p>
    <p style="font-size: 12px; color: #666;">If the button does not work, copy this address into your browser:<br>{link}</p>
  </body>
</html>"#
    )
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

    fn notification() -> Notification {
        Notification {
            owner_name: "Maria".into(),
            business_name: "Café & Açaí <Ltda>".into(),
            phone: "+5511999999999".into(),
            email: "maria@example.com".into(),
            link: "https://onboard.example.com/connect?token=abc".into(),
        }
    }

    #[test]
    fn text_contains_link() {
        let text = activation_text(&notification());
        assert!(text.contains("https://onboard.example.com/connect?token=abc"));
        assert!(text.contains("Maria"));
    }

    #[test]
    fn html_escapes_names_and_keeps_link() {
        let html = activation_html(&notification());
        assert!(html.contains("Café &amp; Açaí &lt;Ltda&gt;"));
        assert!(html.contains(r#"href="https://onboard.example.com/connect?token=abc""#));
    }

    #[test]
    fn escape_html_handles_quotes() {
        assert_eq!(escape_html(r#"a"b'c"#), "a&quot;b&#39;c");
    }
}
