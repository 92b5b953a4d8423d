//! HTML bodies for transactional email.

use caldera_core::Money;

pub const BRAND: &str = "Caldera Journeys";

pub struct ConfirmationView<'a> {
    pub full_name: Option<&'a str>,
    pub booking_id: &'a str,
    pub tx_ref: &'a str,
    pub package_title: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub travelers: u32,
    pub total: Money,
    pub qr_code_url: &'a str,
}

const BASE_STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; } \
.container { max-width: 600px; margin: 0 auto; padding: 20px; } \
.header { background: #1f2a44; color: #fff; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; } \
.content { background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; } \
.footer { text-align: center; margin-top: 30px; color: #666; font-size: 14px; }";

fn page(title: &str, extra_style: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{BASE_STYLE} {extra_style}</style>
</head>
<body>
<div class="container">
{body}
<div class="footer"><p>&copy; {BRAND}. All rights reserved.</p></div>
</div>
</body>
</html>"#
    )
}

pub fn booking_confirmation(view: &ConfirmationView<'_>) -> String {
    let name = escape(view.full_name.filter(|n| !n.trim().is_empty()).unwrap_or("Valued Guest"));
    let rows = [
        ("Booking ID", escape(view.booking_id)),
        ("Transaction Ref", escape(view.tx_ref)),
        ("Package", escape(view.package_title)),
        ("Travel Dates", format!("{} - {}", escape(view.start_date), escape(view.end_date))),
        ("Travelers", view.travelers.to_string()),
        ("Total Amount", format!("${} USD", view.total)),
    ]
    .iter()
    .map(|(label, value)| {
        format!(r#"<div class="detail-row"><span class="detail-label">{label}:</span> <span class="detail-value">{value}</span></div>"#)
    })
    .collect::<Vec<_>>()
    .join("\n");

    let body = format!(
        r#"<div class="header"><h1>Booking Confirmed!</h1><p>Your luxury travel experience awaits</p></div>
<div class="content">
<h2>Hello {name},</h2>
<p>Your booking has been confirmed. We look forward to welcoming you.</p>
<div class="details"><h3>Booking Details</h3>
{rows}
</div>
<div class="qr-section"><h3>Your Digital Pass</h3>
<p>Present this QR code at check-in.</p>
<img src="{qr}" alt="Booking QR Code" style="max-width: 200px; height: auto;">
</div>
<p>Thank you for choosing {BRAND}.</p>
</div>"#,
        qr = view.qr_code_url,
    );
    page(
        "Booking Confirmation",
        ".details, .qr-section { background: #fff; padding: 20px; border-radius: 8px; margin: 20px 0; } \
.qr-section { text-align: center; } .detail-row { margin: 10px 0; border-bottom: 1px solid #eee; } \
.detail-label { font-weight: bold; color: #666; }",
        &body,
    )
}

pub fn welcome(full_name: &str) -> String {
    let body = format!(
        r#"<div class="header"><h1>Welcome to {BRAND}!</h1><p>Your journey to luxury travel begins here</p></div>
<div class="content">
<h2>Hello {name},</h2>
<p>We're thrilled to have you join our community of discerning travelers.</p>
<ul>
<li>Explore our curated destinations</li>
<li>Discover luxury travel packages</li>
<li>Book your next adventure</li>
</ul>
<p>Happy travels!<br>The {BRAND} Team</p>
</div>"#,
        name = escape(full_name),
    );
    page(&format!("Welcome to {BRAND}"), "", &body)
}

pub fn password_reset(reset_url: &str) -> String {
    let body = format!(
        r#"<div class="header"><h1>Password Reset Request</h1></div>
<div class="content">
<h2>Hello,</h2>
<p>We received a request to reset the password for your {BRAND} account.</p>
<a href="{url}" class="button">Reset Password</a>
<p>If you didn't request this, please ignore this email. The link expires in 1 hour.</p>
</div>"#,
        url = escape(reset_url),
    );
    page(
        "Password Reset",
        ".button { display: inline-block; background: #007bff; color: #fff; padding: 12px 24px; text-decoration: none; border-radius: 5px; margin: 20px 0; }",
        &body,
    )
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
