use std::fmt::Write;

use super::fragment::TicketFragment;

const TICKET_CSS: &str = r#"
.ticket{display:flex;font-family:system-ui,sans-serif;color:#111827;border:1px solid #e5e7eb;border-radius:16px;overflow:hidden;max-width:960px;background:#fff}
.ticket-main{flex:1;padding:24px}
.ticket-stub{width:240px;padding:24px;background:#f3f4f6;border-left:2px dashed #d1d5db;text-align:center}
.ticket-header{display:flex;justify-content:space-between;align-items:center}
.ticket-status{background:#16a34a;color:#fff;border-radius:999px;padding:4px 12px;font-weight:700;font-size:12px}
.ticket-route{font-size:22px;font-weight:700;margin:16px 0 4px}
.ticket-grid{display:grid;grid-template-columns:repeat(3,1fr);gap:12px;margin:16px 0}
.ticket-grid dt{font-size:11px;color:#6b7280;text-transform:uppercase}
.ticket-grid dd{margin:0;font-weight:600}
.ticket-total{font-size:24px;font-weight:800}
.ticket-notes{font-size:13px;color:#374151}
.ticket-footer{font-size:11px;color:#6b7280;margin-top:16px}
"#;

const PRINT_CSS: &str = r#"
@page{size:landscape;margin:10mm}
body{margin:0;-webkit-print-color-adjust:exact;print-color-adjust:exact}
.ticket{border:none;max-width:none}
.no-print{display:none}
"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// HTML-фрагмент билета. QR передаётся готовым SVG.
pub fn fragment_html(fragment: &TicketFragment, code_svg: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<article class="ticket" data-booking-id="{id}">"#,
        id = escape(&fragment.identity.booking_id)
    );

    html.push_str(r#"<section class="ticket-main">"#);
    let _ = write!(
        html,
        r#"<header class="ticket-header"><h2 class="ticket-trip">{title}</h2><span class="ticket-status">{status}</span></header>"#,
        title = escape(&fragment.header.title()),
        status = escape(&fragment.status),
    );
    if let Some(logo) = &fragment.logo {
        let _ = write!(html, r#"<img class="ticket-logo" src="{}" alt="logo">"#, escape(logo));
    }

    let _ = write!(
        html,
        r#"<p class="ticket-route">{from} &rarr; {to}</p><p class="ticket-distance">Distance: {distance}</p>"#,
        from = escape(&fragment.route.origin),
        to = escape(&fragment.route.destination),
        distance = escape(&fragment.route.distance),
    );
    if let Some(link) = &fragment.route.map_link {
        let _ = write!(
            html,
            r#"<a class="ticket-map no-print" href="{}" target="_blank" rel="noopener">View route</a>"#,
            escape(link)
        );
    }

    html.push_str(r#"<dl class="ticket-grid">"#);
    for item in &fragment.details {
        let _ = write!(
            html,
            "<div><dt>{}</dt><dd>{}</dd></div>",
            escape(&item.label),
            escape(&item.value)
        );
    }
    html.push_str("</dl>");

    let _ = write!(
        html,
        r#"<p class="ticket-total">Total: <span data-total>{}</span></p><p class="ticket-notes">{}</p>"#,
        escape(&fragment.total),
        escape(&fragment.notes),
    );
    let _ = write!(
        html,
        r#"<footer class="ticket-footer">Issued by {} &middot; Ref {}</footer>"#,
        escape(&fragment.footer.issuer),
        escape(&fragment.footer.reference),
    );
    html.push_str("</section>");

    let _ = write!(
        html,
        r#"<aside class="ticket-stub"><p class="ticket-passenger">{name}</p><p class="ticket-id">{id}</p><div class="ticket-code">{code}</div><p>{phone}<br>{email}</p></aside>"#,
        name = escape(&fragment.identity.passenger),
        id = escape(&fragment.identity.booking_id),
        code = code_svg,
        phone = escape(&fragment.identity.phone),
        email = escape(&fragment.identity.email),
    );

    html.push_str("</article>");
    html
}

pub fn page_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>{}</body></html>",
        escape(title),
        TICKET_CSS,
        body
    )
}

/// Отдельное окно печати: копия билета, минимальные стили и вызов печати.
pub fn print_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{}{}</style></head><body>{}<script>window.addEventListener('load',function(){{window.focus();window.print();}});</script></body></html>",
        escape(title),
        TICKET_CSS,
        PRINT_CSS,
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b>"A&B"</b>"#), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn page_document_carries_ticket_styles() {
        let doc = page_document("Ticket <1>", "<article class=\"ticket\"></article>");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Ticket &lt;1&gt;</title>"));
        assert!(doc.contains(".ticket-stub{"));
        assert!(!doc.contains("window.print()"));
    }

    #[test]
    fn print_document_triggers_print() {
        let doc = print_document("Ticket", "<article></article>");
        assert!(doc.contains("window.print()"));
        assert!(doc.contains("size:landscape"));
        assert!(doc.contains("<article></article>"));
    }
}
