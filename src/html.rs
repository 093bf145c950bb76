//! HTML pages for the landing page and the listings.

use crate::{DoctorPatients, EntityKind, Record};

/// The static landing page.
pub const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Escapes text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n\
         <p><a href=\"/\">Home</a></p>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
    )
}

fn create_form(action: &str, fields: &[&str]) -> String {
    let mut form = format!("<form method=\"post\" action=\"{}\">\n", action);
    for field in fields {
        form.push_str(&format!(
            "<label>{field} <input type=\"text\" name=\"{field}\"></label>\n"
        ));
    }
    form.push_str("<button type=\"submit\">Add</button>\n</form>\n");
    form
}

fn title(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Hospital => "Hospitals",
        EntityKind::Doctor => "Doctors",
        EntityKind::Patient => "Patients",
        EntityKind::Diagnosis => "Diagnoses",
    }
}

/// Renders the listing page of `kind`: a creation form and one table row per record.
pub fn render_listing(kind: EntityKind, records: &[Record]) -> String {
    let fields = kind.fields();
    let mut body = create_form(&format!("/{}", kind.prefix()), fields);
    if records.is_empty() {
        body.push_str("<p>Nothing here yet.</p>\n");
        return page(title(kind), &body);
    }
    body.push_str("<table>\n<tr>");
    for field in fields {
        body.push_str(&format!("<th>{}</th>", field));
    }
    body.push_str("</tr>\n");
    for record in records {
        body.push_str("<tr>");
        for field in fields {
            let value = record.get(*field).map(String::as_str).unwrap_or("");
            body.push_str(&format!("<td>{}</td>", escape_html(value)));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");
    page(title(kind), &body)
}

/// Renders the doctor to patient page: a link form and one row per doctor.
pub fn render_links(links: &[DoctorPatients]) -> String {
    let mut body = create_form("/doctor-patient", &["doctor_ID", "patient_ID"]);
    if links.is_empty() {
        body.push_str("<p>Nothing here yet.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>doctor_ID</th><th>patient_ID</th></tr>\n");
        for entry in links {
            let patients: Vec<String> = entry.patient_ids.iter().map(|p| escape_html(p)).collect();
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(&entry.doctor_id),
                patients.join(", ")
            ));
        }
        body.push_str("</table>\n");
    }
    page("Doctors and patients", &body)
}
