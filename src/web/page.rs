use std::fmt::Write;

use super::Analysis;
use crate::input::{MAX_VALUES, MIN_VALUES};

#[derive(Default)]
pub struct Page<'a> {
    /// Submitted text, echoed back into the textarea.
    pub numbers: &'a str,
    pub error: Option<String>,
    pub analysis: Option<&'a Analysis>,
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_p(p: f64) -> String {
    if p != 0.0 && p < 1e-4 {
        format!("{p:.3e}")
    } else {
        format!("{p:.4}")
    }
}

fn render_results(html: &mut String, analysis: &Analysis) {
    let r = &analysis.report;
    let rows = [
        ("n", r.n.to_string()),
        ("Mean", format!("{:.4}", r.mean)),
        ("Median", format!("{:.4}", r.median)),
        ("Sample std (ddof=1)", format!("{:.4}", r.std_sample)),
        ("Skewness", format!("{:.4}", r.skewness)),
        ("Excess kurtosis", format!("{:.4}", r.kurtosis_excess)),
        ("Shapiro-Wilk W", format!("{:.4}", r.shapiro_stat)),
        ("Shapiro-Wilk p", format_p(r.shapiro_p)),
        ("D'Agostino K²", format!("{:.4}", r.dagostino_stat)),
        ("D'Agostino p", format_p(r.dagostino_p)),
    ];

    html.push_str("<section class=\"results\">\n<h2>Results</h2>\n<table>\n");
    for (label, value) in rows {
        let _ = writeln!(
            html,
            "<tr><th>{}</th><td>{value}</td></tr>",
            escape(label)
        );
    }
    html.push_str("</table>\n");

    let _ = writeln!(
        html,
        "<p><strong>Shapiro-Wilk:</strong> {}</p>\n<p><strong>D&#x27;Agostino K²:</strong> {}</p>",
        r.interpretation_shapiro, r.interpretation_dagostino
    );
    let _ = writeln!(
        html,
        "<h3>Histogram</h3>\n<img alt=\"Histogram\" src=\"data:image/png;base64,{}\">",
        analysis.charts.histogram
    );
    let _ = writeln!(
        html,
        "<h3>Q-Q Plot</h3>\n<img alt=\"Q-Q Plot\" src=\"data:image/png;base64,{}\">",
        analysis.charts.qq_plot
    );
    html.push_str("</section>\n");
}

pub fn render(page: &Page<'_>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Normality check</title>\n</head>\n<body>\n<h1>Normality check</h1>\n",
    );

    html.push_str("<form method=\"post\" action=\"/\">\n");
    if let Some(error) = &page.error {
        let _ = writeln!(
            html,
            "<ul class=\"errorlist\"><li>{}</li></ul>",
            escape(error)
        );
    }
    let _ = writeln!(
        html,
        "<label for=\"id_numbers\">Enter {MIN_VALUES}–{MAX_VALUES} numbers (separate by comma, \
         space, newline or semicolon)</label>\n\
         <textarea name=\"numbers\" id=\"id_numbers\" rows=\"4\" cols=\"40\" required>{}</textarea>\n\
         <span class=\"helptext\">Example: 12.3, 4, 5.6 7 8</span>",
        escape(page.numbers)
    );
    html.push_str("<button type=\"submit\">Analyze</button>\n</form>\n");

    if let Some(analysis) = page.analysis {
        render_results(&mut html, analysis);
    }

    html.push_str("</body>\n</html>\n");
    html
}
