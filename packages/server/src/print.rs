//! Printable QR sheet for a hunt.
//!
//! Each scan point encodes the link a hunter follows after finding it: the
//! starting code leads to the first clue, the code placed at clue `n` leads
//! to clue `n + 1`, and the last one leads to the completion page.

use std::fmt::Write;

use common::{DeepLink, Hunt};

pub const DEFAULT_QR_IMAGE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Label overlaid on the starting code.
pub const START_LABEL: &str = "★";

const START_TEXT: &str = "Starting QR Code";
const EMPTY_CLUE_TEXT: &str = "No clue text";
const QR_SIZE_PX: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPoint {
    pub label: String,
    pub link: DeepLink,
    /// Absolute URL encoded into the QR image.
    pub url: String,
    pub clue_text: String,
    pub hint_text: String,
}

/// Scan points in print order. A hunt without clues has none.
pub fn scan_points(hunt: &Hunt, origin: &str) -> Vec<ScanPoint> {
    let Some(first) = hunt.clues.first() else {
        return Vec::new();
    };

    let point = |label: String, link: DeepLink, clue_text: &str, hint_text: &str| ScanPoint {
        label,
        url: link.url(origin),
        link,
        clue_text: clue_text.to_string(),
        hint_text: hint_text.to_string(),
    };

    let mut points = Vec::with_capacity(hunt.clues.len() + 1);
    points.push(point(
        START_LABEL.to_string(),
        DeepLink::Clue {
            hunt_id: hunt.id,
            clue_id: first.id,
        },
        START_TEXT,
        "",
    ));

    for (i, clue) in hunt.clues.iter().enumerate() {
        let link = match hunt.clues.get(i + 1) {
            Some(next) => DeepLink::Clue {
                hunt_id: hunt.id,
                clue_id: next.id,
            },
            None => DeepLink::Complete { hunt_id: hunt.id },
        };
        let text = if clue.text.is_empty() {
            EMPTY_CLUE_TEXT
        } else {
            clue.text.as_str()
        };
        points.push(point((i + 1).to_string(), link, text, &clue.hint));
    }

    points
}

/// QR image source for `data` on the configured image service.
pub fn qr_image_src(qr_image_url: &str, data: &str) -> String {
    format!(
        "{qr_image_url}?size={QR_SIZE_PX}x{QR_SIZE_PX}&data={}&ecc=H",
        urlencoding::encode(data)
    )
}

/// Render a self-contained A4 page that prints itself once the QR images load.
pub fn render_sheet(hunt: &Hunt, points: &[ScanPoint], qr_image_url: &str) -> String {
    let title = escape_html(hunt.title());

    let mut cells = String::new();
    for point in points {
        let label = escape_html(&point.label);
        let hint = if point.hint_text.is_empty() {
            String::new()
        } else {
            format!(
                r#"<div class="hint-text">Hint: {}</div>"#,
                escape_html(&point.hint_text)
            )
        };
        // Writing to a String cannot fail.
        let _ = write!(
            cells,
            r#"
      <div class="qr-item">
        <div class="qr-image">
          <img src="{src}" width="{QR_SIZE_PX}" height="{QR_SIZE_PX}" alt="QR Code {label}" />
          <div class="qr-overlay">{label}</div>
        </div>
        <div class="clue-text">{text}</div>
        {hint}
      </div>"#,
            src = escape_html(&qr_image_src(qr_image_url, &point.url)),
            text = escape_html(&point.clue_text),
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>Print QR Codes - {title}</title>
    <style>
      @page {{ size: A4; margin: 15mm; }}
      body {{ margin: 0; padding: 15mm; font-family: Arial, sans-serif; background: white; }}
      .hunt-title {{ text-align: center; font-size: 24px; font-weight: bold; margin-bottom: 30px; }}
      .qr-grid {{ display: grid; grid-template-columns: repeat(4, 39mm); column-gap: 8mm; row-gap: 12mm; justify-content: center; }}
      .qr-item {{ width: 39mm; text-align: center; break-inside: avoid; page-break-inside: avoid; }}
      .qr-image {{ position: relative; width: {QR_SIZE_PX}px; height: {QR_SIZE_PX}px; margin: 0 auto; }}
      .qr-image img {{ border: 2px solid black; border-radius: 4px; background: white; }}
      .qr-overlay {{ position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); background: white; border: 2px solid black; border-radius: 50%; width: 32px; height: 32px; display: flex; align-items: center; justify-content: center; font-size: 16px; font-weight: bold; }}
      .clue-text {{ font-size: 10px; font-weight: bold; margin: 8px 0 4px 0; line-height: 1.2; word-wrap: break-word; }}
      .hint-text {{ font-size: 9px; color: #666; font-style: italic; line-height: 1.2; word-wrap: break-word; }}
    </style>
  </head>
  <body>
    <div class="hunt-title">{title}</div>
    <div class="qr-grid">{cells}
    </div>
    <script>
      window.onafterprint = function () {{ window.close(); }};
      window.onload = function () {{
        const images = Array.from(document.querySelectorAll('img'));
        let pending = images.length;
        if (pending === 0) {{ window.print(); return; }}
        const done = function () {{
          pending -= 1;
          if (pending === 0) {{ setTimeout(function () {{ window.print(); }}, 100); }}
        }};
        images.forEach(function (img) {{
          if (img.complete) {{ done(); }} else {{ img.onload = done; img.onerror = done; }}
        }});
      }};
    </script>
  </body>
</html>
"#
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
