//! HTML pages for the web interface
//!
//! Plain server-rendered markup. Every value that came from the user or a
//! data source goes through `escape`.

use crate::application::Investigation;
use crate::domain::MAX_INPUT_LEN;

const STYLE: &str = "body{font-family:sans-serif;max-width:860px;margin:2em auto;padding:0 1em}\
label{display:block;margin-top:.8em}input[type=text]{width:100%;padding:.4em}\
.error{color:#a00}.muted{color:#666}li{margin:.2em 0}";

pub fn escape(s: &str) -> String {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{}</style></head><body>\n{}\n</body></html>\n",
        escape(title),
        STYLE,
        body
    )
}

fn form(value: &str) -> String {
    format!(
        r#"<form method="post" action="/analyze">
<label>Wallet address or transaction hash
<input type="text" name="identifier" maxlength="{max}" value="{value}" autofocus></label>
<label>Kind
<select name="kind"><option value="auto">auto</option><option value="address">address</option><option value="tx">transaction</option></select></label>
<label>Network
<select name="network"><option value="auto">auto</option><option value="ethereum">ethereum</option><option value="polygon">polygon</option><option value="tron">tron</option></select></label>
<p><button type="submit">Investigate</button></p>
</form>"#,
        max = MAX_INPUT_LEN,
        value = escape(value)
    )
}

/// Landing page, optionally with an error above the form
pub fn form_page(error: Option<&str>, value: &str) -> String {
    let mut body = String::from("<h1>Chain Investigator</h1>\n");
    if let Some(msg) = error {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(msg)));
    }
    body.push_str(&form(value));
    layout("Chain Investigator", &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Report failed</h1>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>",
        escape(message)
    );
    layout("Report failed", &body)
}

pub fn result_page(inv: &Investigation) -> String {
    let report = &inv.report;
    let mut body = format!(
        "<h1>Report for {}</h1>\n<p class=\"muted\">{}</p>\n<ul>\n",
        escape(report.identifier.as_str()),
        escape(&report.identifier.kind().to_string())
    );
    for line in &report.summary.lines {
        body.push_str(&format!("<li>{}</li>\n", escape(line)));
    }
    body.push_str("</ul>\n<h2>Data sources</h2>\n<ul>\n");
    for status in &report.sources {
        body.push_str(&format!(
            "<li>{} ({}): {}</li>\n",
            escape(&status.source),
            escape(&status.role.to_string()),
            escape(&status.state.to_string())
        ));
    }
    body.push_str("</ul>\n<h2>Downloads</h2>\n<ul>\n");
    for artifact in &inv.output.artifacts {
        let name = escape(&artifact.file_name());
        body.push_str(&format!("<li><a href=\"/download/{0}\">{0}</a></li>\n", name));
    }
    body.push_str(&format!(
        "</ul>\n<p class=\"muted\">PDF: {}<br>CSV: {}</p>\n",
        escape(&inv.output.pdf.describe()),
        escape(&inv.output.csv.describe())
    ));
    body.push_str("<h2>New report</h2>\n");
    body.push_str(&form(""));
    layout("Report", &body)
}
