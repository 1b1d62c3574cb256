//! HTML rendering for the web interface.

use std::fmt::Write as FmtWrite;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{Answer, Rating};

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
input[type=text],textarea{width:100%;padding:.5rem;box-sizing:border-box}\
.answer{white-space:pre-wrap;background:#f6f8fa;padding:1rem;border-radius:6px}\
.error{color:#b00020}.meta{color:#555}";

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
<title>Document Q&amp;A</title>\n<style>{STYLE}</style>\n</head>\n\
<body>\n<h1>Document Q&amp;A</h1>\n{body}</body>\n</html>\n"
    )
}

fn question_form(question: &str) -> String {
    format!(
        "<form method=\"get\" action=\"/\">\n\
<input type=\"text\" name=\"q\" dir=\"auto\" placeholder=\"Ask a question (Arabic or English)\" value=\"{}\">\n\
<button type=\"submit\">Ask</button>\n</form>\n",
        encode_double_quoted_attribute(question)
    )
}

/// Empty page with only the question form.
pub fn index_page() -> String {
    layout(&question_form(""))
}

/// Answer, sources, trust score and a feedback form carrying the answer back.
pub fn answer_page(answer: &Answer) -> String {
    let mut body = question_form(&answer.question);

    writeln!(body, "<h2>Answer</h2>").unwrap();
    writeln!(
        body,
        "<div class=\"answer\" dir=\"auto\">{}</div>",
        encode_text(&answer.answer)
    )
    .unwrap();

    writeln!(body, "<h3>Sources</h3>").unwrap();
    if answer.sources.is_empty() {
        writeln!(body, "<p class=\"meta\">No sources cited.</p>").unwrap();
    } else {
        writeln!(body, "<ul>").unwrap();
        for source in &answer.sources {
            writeln!(body, "<li dir=\"auto\">{}</li>", encode_text(source)).unwrap();
        }
        writeln!(body, "</ul>").unwrap();
    }

    writeln!(
        body,
        "<p class=\"meta\">Trust score: {}%</p>",
        answer.trust_score()
    )
    .unwrap();

    writeln!(body, "<h3>Feedback</h3>").unwrap();
    writeln!(body, "<form method=\"post\" action=\"/feedback\">").unwrap();
    for (name, value) in [
        ("question", answer.question.clone()),
        ("answer", answer.answer.clone()),
        ("sources", answer.sources_label()),
        ("trust_score", answer.trust_score().to_string()),
    ] {
        writeln!(
            body,
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
            name,
            encode_double_quoted_attribute(&value)
        )
        .unwrap();
    }
    writeln!(
        body,
        "<textarea name=\"comment\" dir=\"auto\" placeholder=\"Comment\"></textarea>"
    )
    .unwrap();
    writeln!(body, "<label>Rating <select name=\"rating\">").unwrap();
    for value in Rating::MIN..=Rating::MAX {
        let selected = if value == Rating::default().value() {
            " selected"
        } else {
            ""
        };
        writeln!(body, "<option value=\"{value}\"{selected}>{value}</option>").unwrap();
    }
    writeln!(body, "</select></label>").unwrap();
    writeln!(body, "<button type=\"submit\">Submit feedback</button>\n</form>").unwrap();

    layout(&body)
}

pub fn feedback_page() -> String {
    layout("<p>Thank you, your feedback was recorded.</p>\n<p><a href=\"/\">Ask another question</a></p>\n")
}

pub fn error_page(question: &str, message: &str) -> String {
    let body = format!(
        "{}<p class=\"error\">{}</p>\n",
        question_form(question),
        encode_text(message)
    );
    layout(&body)
}
