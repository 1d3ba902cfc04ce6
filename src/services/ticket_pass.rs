use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::{ClientError, Result};
use crate::models::Ticket;

const WIDTH: u32 = 600;
const HEIGHT: u32 = 300;
const QR_SIZE: u32 = 180;

#[derive(Debug, Clone)]
pub struct QrImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait QrFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<QrImage>;
}

pub struct HttpQrFetcher {
    client: reqwest::Client,
}

impl HttpQrFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpQrFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QrFetcher for HttpQrFetcher {
    async fn fetch(&self, url: &str) -> Result<QrImage> {
        let resp = self.client.get(url).send().await?.error_for_status()?;

        let mime = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        if !mime.starts_with("image/") {
            return Err(ClientError::Upload(format!("QR link returned {mime}")));
        }

        let bytes = resp.bytes().await?.to_vec();
        Ok(QrImage { mime, bytes })
    }
}

/// A self-contained ticket image ready to be saved by the user.
#[derive(Debug, Clone)]
pub struct TicketPass {
    pub file_name: String,
    pub svg: String,
}

impl TicketPass {
    pub fn render(ticket: &Ticket, qr: Option<&QrImage>) -> Self {
        let details = &ticket.event_details;
        let dates = if details.date.is_empty() {
            "Date TBA".to_string()
        } else {
            details.date.join(", ")
        };
        let times = match (&details.start_time, &details.end_time) {
            (Some(start), Some(end)) => format!("{start} - {end}"),
            (Some(start), None) => start.clone(),
            _ => String::new(),
        };

        let lines = [
            (40, 22, "bold", details.title.as_str().to_string()),
            (80, 14, "normal", dates),
            (104, 14, "normal", times),
            (128, 14, "normal", details.venue.clone().unwrap_or_default()),
            (
                176,
                14,
                "normal",
                format!("Qty {} | Total {:.2}", ticket.quantity, ticket.total_amount),
            ),
            (
                200,
                12,
                "normal",
                format!("Ticket {} ({})", ticket.ticket_id, ticket.ticket_status.as_str()),
            ),
        ];

        let mut svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"##
        );
        svg.push_str(&format!(
            r##"<rect x="0" y="0" width="{WIDTH}" height="{HEIGHT}" rx="16" fill="#ffffff" stroke="#d1d5db"/>"##
        ));

        for (y, size, weight, text) in lines.iter().filter(|l| !l.3.is_empty()) {
            svg.push_str(&format!(
                r##"<text x="24" y="{y}" font-family="sans-serif" font-size="{size}" font-weight="{weight}" fill="#111827">{}</text>"##,
                escape_xml(text)
            ));
        }

        let qr_x = WIDTH - QR_SIZE - 24;
        let qr_y = (HEIGHT - QR_SIZE) / 2;
        match qr {
            Some(image) => svg.push_str(&format!(
                r##"<image x="{qr_x}" y="{qr_y}" width="{QR_SIZE}" height="{QR_SIZE}" href="data:{};base64,{}"/>"##,
                escape_xml(&image.mime),
                STANDARD.encode(&image.bytes)
            )),
            None => {
                let label_y = qr_y + QR_SIZE / 2;
                let label_x = qr_x + QR_SIZE / 2;
                svg.push_str(&format!(
                    r##"<rect x="{qr_x}" y="{qr_y}" width="{QR_SIZE}" height="{QR_SIZE}" fill="#f3f4f6" stroke="#9ca3af" stroke-dasharray="6 4"/>"##
                ));
                svg.push_str(&format!(
                    r##"<text x="{label_x}" y="{label_y}" text-anchor="middle" font-family="sans-serif" font-size="12" fill="#6b7280">QR unavailable</text>"##
                ));
            }
        }

        svg.push_str("</svg>");

        Self {
            file_name: format!("ticket-{}.svg", ticket.ticket_id),
            svg,
        }
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticket::sample_ticket;
    use crate::models::TicketStatus;

    #[test]
    fn test_render_embeds_qr() {
        let ticket = sample_ticket("TKT-1", TicketStatus::Active);
        let qr = QrImage {
            mime: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        let pass = TicketPass::render(&ticket, Some(&qr));
        assert!(pass.svg.contains("data:image/png;base64,iVBORw=="));
        assert!(pass.svg.contains("Summer Jazz Night"));
        assert!(pass.svg.contains("19:00 - 23:00"));
        assert!(!pass.svg.contains("QR unavailable"));
    }

    #[test]
    fn test_render_escapes_text() {
        let mut ticket = sample_ticket("TKT-2", TicketStatus::Unused);
        ticket.event_details.title = "Rock & Roll <Live>".to_string();
        let pass = TicketPass::render(&ticket, None);
        assert!(pass.svg.contains("Rock &amp; Roll &lt;Live&gt;"));
        assert!(pass.svg.ends_with("</svg>"));
    }
}
