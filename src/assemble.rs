//! Assemble the rendered [`Panels`] into a single self-contained html document and write it out.

use std::{fmt::Write, path::Path};

use html_builder::Html5;

use crate::{fs, render::Panels};

/// plotly.js, included once and shared by every panel.
pub const PLOTLY_JS_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
body {
    font-family: Arial, sans-serif;
    margin: 0;
    background: #f4f6f8;
    color: #1f2d3d;
}
header, footer {
    padding: 1rem 2rem;
}
footer {
    font-size: 0.85rem;
    color: #5a6a7a;
}
.dashboard-grid {
    display: grid;
    grid-template-columns: repeat(2, minmax(0, 1fr));
    gap: 1rem;
    padding: 0 2rem;
}
.panel {
    background: white;
    border-radius: 4px;
    min-height: 420px;
}
.panel-wide {
    grid-column: 1 / span 2;
}
"#;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error serializing chart figure")]
    Serialize(#[from] serde_json::Error),
    #[error("Error formatting html")]
    Format(#[from] std::fmt::Error),
}

/// Fixed document layout with placeholders for the station specific text and the panels.
pub struct DashboardTemplate<'a> {
    /// Station name shown in the title and header.
    pub station_name: &'a str,
    /// Measurement time shown in the footer.
    pub observed_at: Option<&'a str>,
    pub panels: &'a Panels,
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Serialize `value` as json which can be embedded in a `<script>` element. Markup characters
/// only occur inside json strings, where they are replaced with unicode escapes.
fn script_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?
        .replace('&', "\\u0026")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e"))
}

impl<'a> DashboardTemplate<'a> {
    pub fn title(&self) -> String {
        format!("Air Quality Dashboard: {}", self.station_name)
    }

    /// The `Plotly.newPlot()` calls drawing each panel into its element.
    fn plot_script(&self) -> Result<String, Error> {
        let mut script = String::new();
        for panel in self.panels.iter() {
            writeln!(
                script,
                "Plotly.newPlot({}, {}, {}, {{\"responsive\": true, \"displaylogo\": false}});",
                script_json(&panel.id)?,
                script_json(&panel.figure.data)?,
                script_json(&panel.figure.layout)?,
            )?;
        }
        Ok(script)
    }

    pub fn to_html(&self) -> Result<String, Error> {
        let title = escape_html(&self.title());

        let mut buf = html_builder::Buffer::new();
        let mut html = buf.html().attr(r#"lang="en""#);

        let mut head = html.head();
        head.meta().attr(r#"charset="utf-8""#);
        head.meta()
            .attr(r#"name="viewport" content="width=device-width, initial-scale=1""#);
        write!(head.title(), "{}", title)?;
        head.script()
            .attr(&format!(r#"src="{}" charset="utf-8""#, PLOTLY_JS_URL));
        head.style().write_str(STYLE)?;

        let mut body = html.body();
        write!(body.header().h1(), "{}", title)?;

        let mut grid = body.div().attr(r#"class="dashboard-grid""#);
        for panel in self.panels.iter() {
            let class = if panel.wide {
                "panel panel-wide"
            } else {
                "panel"
            };
            grid.div()
                .attr(&format!(r#"id="{}" class="{}""#, panel.id, class));
        }

        let mut footer = body.footer();
        write!(
            footer,
            r#"Data: <a href="https://aqicn.org/">World Air Quality Index Project</a>"#
        )?;
        if let Some(observed_at) = self.observed_at {
            write!(footer, ", measured {}", escape_html(observed_at))?;
        }

        body.script().write_str(&self.plot_script()?)?;

        Ok(buf.finish())
    }
}

/// Write the dashboard to `path`, replacing any existing file.
#[tracing::instrument(skip(html))]
pub async fn write_dashboard(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_if_not_exists(parent)?;
    }
    fs::replace_file(path, html.as_bytes()).await?;
    tracing::info!("Dashboard written to {:?}", path);
    Ok(())
}
